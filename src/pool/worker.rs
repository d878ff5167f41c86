//! Pool Workers
//!
//! Each worker is a blocking loop on its own thread (`spawn_blocking`), fed
//! tasks over a per-worker job channel and reporting results on the shared
//! event channel. Workers never share memory with the pool or each other;
//! everything crosses the channels by value.
//!
//! A small watcher task per worker awaits the loop's join handle and turns
//! any exit (including a panic) into a `WorkerEvent::Exited`, which is how
//! the supervisor learns about worker death.

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::pool::task::{TaskId, TaskOutput, TaskRequest};

/// Worker identifier, unique within a pool's lifetime.
pub type WorkerId = u32;

// == Worker State ==
/// Explicit worker occupancy, updated on dispatch and completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
}

// == Worker Job ==
/// One task handed to one worker.
#[derive(Debug)]
pub struct WorkerJob {
    pub task_id: TaskId,
    pub request: TaskRequest,
}

// == Worker Event ==
/// Everything a worker (or its watcher) reports back to the supervisor.
#[derive(Debug)]
pub enum WorkerEvent {
    /// The worker finished a task, successfully or not
    Completed {
        worker_id: WorkerId,
        task_id: TaskId,
        outcome: Result<TaskOutput, String>,
        processing_time: Duration,
    },
    /// The worker's loop ended; treated as death unless the pool is
    /// shutting down
    Exited { worker_id: WorkerId },
}

// == Worker Handle ==
/// The supervisor's side of a worker: identity, occupancy, and the job
/// channel feeding the worker loop.
#[derive(Debug)]
pub struct WorkerHandle {
    pub id: WorkerId,
    pub state: WorkerState,
    job_tx: mpsc::Sender<WorkerJob>,
}

impl WorkerHandle {
    /// Builds a handle over an existing job channel. Tests use this with a
    /// held receiver to observe dispatch order directly.
    pub fn new(id: WorkerId, job_tx: mpsc::Sender<WorkerJob>) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            job_tx,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == WorkerState::Idle
    }

    // == Dispatch ==
    /// Hands a job to the worker and marks it busy.
    ///
    /// If the worker's channel is gone (it died between selection and
    /// dispatch), the job is handed back unchanged and state is untouched.
    pub fn dispatch(&mut self, job: WorkerJob) -> std::result::Result<(), WorkerJob> {
        match self.job_tx.try_send(job) {
            Ok(()) => {
                self.state = WorkerState::Busy;
                Ok(())
            }
            Err(err) => {
                warn!(worker_id = self.id, "Dispatch to worker failed");
                Err(err.into_inner())
            }
        }
    }

    /// Marks the worker available again after it reported a completion.
    pub fn mark_idle(&mut self) {
        self.state = WorkerState::Idle;
    }
}

// == Spawn ==
/// Starts a worker loop plus its exit watcher, returning the handle.
pub fn spawn_worker(
    id: WorkerId,
    events: mpsc::Sender<WorkerEvent>,
    large_payload_bytes: usize,
) -> WorkerHandle {
    let (job_tx, mut job_rx) = mpsc::channel::<WorkerJob>(1);

    let loop_events = events.clone();
    let join = tokio::task::spawn_blocking(move || {
        debug!(worker_id = id, "Worker started");
        while let Some(job) = job_rx.blocking_recv() {
            debug!(
                worker_id = id,
                task_id = job.task_id,
                kind = job.request.kind(),
                "Executing task"
            );
            let start = Instant::now();
            let outcome = execute_request(job.request, large_payload_bytes);
            let report = WorkerEvent::Completed {
                worker_id: id,
                task_id: job.task_id,
                outcome,
                processing_time: start.elapsed(),
            };
            if loop_events.blocking_send(report).is_err() {
                break;
            }
        }
        debug!(worker_id = id, "Worker loop ended");
    });

    // Watcher: translate loop exit (normal or panic) into an event
    tokio::spawn(async move {
        if let Err(err) = join.await {
            warn!(worker_id = id, "Worker thread panicked: {}", err);
        }
        let _ = events.send(WorkerEvent::Exited { worker_id: id }).await;
    });

    WorkerHandle::new(id, job_tx)
}

// == Execute ==
/// Runs one JSON operation. Application failures come back as an error
/// string; they are the worker's result, not its death.
fn execute_request(request: TaskRequest, large_payload_bytes: usize) -> Result<TaskOutput, String> {
    match request {
        TaskRequest::Parse(text) => {
            // Above the threshold, use the incremental reader-based parser.
            // The text is already resident, so this changes the parsing
            // strategy, not peak memory.
            let parsed: Result<Value, serde_json::Error> = if text.len() > large_payload_bytes {
                serde_json::from_reader(text.as_bytes())
            } else {
                serde_json::from_str(&text)
            };
            parsed.map(TaskOutput::Parsed).map_err(|e| e.to_string())
        }
        TaskRequest::Stringify(value) => serde_json::to_string(&value)
            .map(TaskOutput::Text)
            .map_err(|e| e.to_string()),
    }
}
