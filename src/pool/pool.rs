//! Worker Task Pool
//!
//! The public face of the pool: an async handle that forwards commands to
//! the supervisor's event loop. The loop is the only place pool state is
//! touched, so commands, worker events, and reaper ticks interleave at
//! message granularity and never mid-handler.
//!
//! The queue is unbounded by design; bounding submission volume is the
//! caller's capacity planning, and the stale-task reaper caps how long any
//! pending future can linger.

use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::pool::supervisor::{PoolConfig, PoolStats, Supervisor};
use crate::pool::task::{TaskOutput, TaskPriority, TaskRequest};
use crate::pool::worker::WorkerEvent;

// == Commands ==
enum Command {
    Enqueue {
        request: TaskRequest,
        priority: TaskPriority,
        reply: oneshot::Sender<Result<TaskOutput>>,
    },
    Stats {
        reply: oneshot::Sender<PoolStats>,
    },
    Destroy {
        reply: oneshot::Sender<()>,
    },
}

// == Worker Task Pool ==
/// Fixed-size pool of workers executing JSON parse/stringify tasks pulled
/// from a priority queue, with automatic worker replacement on failure.
#[derive(Clone)]
pub struct WorkerTaskPool {
    cmd_tx: mpsc::Sender<Command>,
}

impl WorkerTaskPool {
    // == Constructor ==
    /// Starts the pool: spawns the configured workers and the supervisor
    /// loop. Fails fast on degenerate parameters.
    pub fn new(config: PoolConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(Error::InvalidConfig(
                "pool worker count must be non-zero".to_string(),
            ));
        }
        if config.task_timeout.is_zero() || config.reap_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "pool timeouts must be non-zero".to_string(),
            ));
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let (events_tx, events_rx) = mpsc::channel(config.workers * 2 + 8);

        let mut supervisor = Supervisor::new(config, events_tx);
        supervisor.spawn_workers_to_target();
        info!(
            workers = supervisor.stats().active_workers,
            "Worker pool started"
        );

        tokio::spawn(run_loop(supervisor, cmd_rx, events_rx));
        Ok(Self { cmd_tx })
    }

    // == Enqueue ==
    /// Submits a task and waits for its result.
    ///
    /// Returns as soon as the task is accepted in the sense that the
    /// returned future resolves with the worker's result, a typed timeout,
    /// or a shutdown error. Tasks of equal priority complete dispatch in
    /// submission order; completion order across workers is not guaranteed.
    pub async fn enqueue(&self, request: TaskRequest, priority: TaskPriority) -> Result<TaskOutput> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Enqueue {
                request,
                priority,
                reply,
            })
            .await
            .map_err(|_| Error::PoolDestroyed)?;
        rx.await.map_err(|_| Error::PoolDestroyed)?
    }

    // == Stats ==
    /// Returns a snapshot of the pool's counters.
    pub async fn stats(&self) -> Result<PoolStats> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Stats { reply })
            .await
            .map_err(|_| Error::PoolDestroyed)?;
        rx.await.map_err(|_| Error::PoolDestroyed)
    }

    // == Destroy ==
    /// Rejects all pending tasks with a pool-destroyed error and terminates
    /// every worker. Resolves once the supervisor confirms. Safe to call
    /// more than once.
    pub async fn destroy(&self) {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Destroy { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }
}

// == Event Loop ==
async fn run_loop(
    mut supervisor: Supervisor,
    mut cmd_rx: mpsc::Receiver<Command>,
    mut events_rx: mpsc::Receiver<WorkerEvent>,
) {
    // Cooldown expirations arrive on an internal channel so a delayed
    // replacement never keeps the command channel alive
    let (replenish_tx, mut replenish_rx) = mpsc::channel::<()>(8);
    let mut reap = tokio::time::interval(supervisor.config().reap_interval);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Enqueue { request, priority, reply }) => {
                    supervisor.enqueue(request, priority, reply);
                }
                Some(Command::Stats { reply }) => {
                    let _ = reply.send(supervisor.stats());
                }
                Some(Command::Destroy { reply }) => {
                    supervisor.destroy();
                    let _ = reply.send(());
                    break;
                }
                // Every pool handle dropped without destroy: shut down anyway
                None => {
                    supervisor.destroy();
                    break;
                }
            },
            Some(event) = events_rx.recv() => match event {
                WorkerEvent::Completed { worker_id, task_id, outcome, processing_time } => {
                    supervisor.on_completed(worker_id, task_id, outcome, processing_time);
                }
                WorkerEvent::Exited { worker_id } => {
                    if supervisor.on_exited(worker_id) {
                        let tx = replenish_tx.clone();
                        let cooldown = supervisor.config().restart_cooldown;
                        tokio::spawn(async move {
                            tokio::time::sleep(cooldown).await;
                            let _ = tx.send(()).await;
                        });
                    }
                }
            },
            Some(()) = replenish_rx.recv() => supervisor.spawn_replacement(),
            _ = reap.tick() => supervisor.reap_stale(Instant::now()),
        }
    }
    debug!("Pool supervisor loop ended");
}
