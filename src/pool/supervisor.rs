//! Pool Supervisor
//!
//! The single owner of the pool's mutable state: worker handles, the task
//! queue, and the pending-task map. The event loop in `pool.rs` feeds it
//! commands and worker events one at a time, so every method here runs
//! atomically with respect to the others. Keeping the state machine on a
//! plain struct also lets tests drive crash and timeout paths directly,
//! without real thread failures.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::pool::task::{QueuedTask, TaskId, TaskOutput, TaskPriority, TaskQueue, TaskRequest};
use crate::pool::worker::{spawn_worker, WorkerEvent, WorkerHandle, WorkerId, WorkerJob};

/// Fire-and-forget hook invoked with (operation, detail) on worker failures.
/// Observational only; pool behavior never depends on it.
pub type ErrorHook = Arc<dyn Fn(&str, &str) + Send + Sync>;

// == Pool Config ==
/// Worker pool construction parameters.
#[derive(Clone)]
pub struct PoolConfig {
    /// Fixed worker count, the hard bound on parallel JSON work
    pub workers: usize,
    /// Age at which a pending task is reaped with a timeout error
    pub task_timeout: Duration,
    /// How often the stale-task reaper runs
    pub reap_interval: Duration,
    /// Delay before a dead worker is replaced, to avoid restart storms
    pub restart_cooldown: Duration,
    /// Parse payloads above this size take the reader-based parse path
    pub large_payload_bytes: usize,
    /// Error reporter hook for worker crashes
    pub on_worker_error: Option<ErrorHook>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            task_timeout: Duration::from_secs(30),
            reap_interval: Duration::from_secs(10),
            restart_cooldown: Duration::from_secs(1),
            large_payload_bytes: 1024 * 1024,
            on_worker_error: None,
        }
    }
}

// == Pool Stats ==
/// Pool counters reported by `stats`.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    /// Tasks for which a worker reported a result
    pub total_processed: u64,
    /// Failed tasks: application errors, timeouts, and worker deaths
    pub error_count: u64,
    /// Mean worker processing time across reported results
    pub avg_processing_time_ms: f64,
    /// Workers currently alive
    pub active_workers: usize,
    /// Tasks waiting for an idle worker
    pub queue_size: usize,
}

// == Pending Task ==
/// Bookkeeping for a task whose caller is still waiting.
struct PendingTask {
    reply: oneshot::Sender<Result<TaskOutput>>,
    enqueued_at: Instant,
    assigned_to: Option<WorkerId>,
}

// == Supervisor ==
/// The pool's state machine.
pub struct Supervisor {
    config: PoolConfig,
    events_tx: mpsc::Sender<WorkerEvent>,
    workers: Vec<WorkerHandle>,
    queue: TaskQueue,
    pending: HashMap<TaskId, PendingTask>,
    next_task_id: TaskId,
    next_worker_id: WorkerId,
    total_processed: u64,
    error_count: u64,
    total_processing: Duration,
    destroyed: bool,
}

impl Supervisor {
    // == Constructor ==
    /// Creates a supervisor with no workers yet; call
    /// `spawn_workers_to_target` (or `add_worker` in tests) to populate it.
    pub fn new(config: PoolConfig, events_tx: mpsc::Sender<WorkerEvent>) -> Self {
        Self {
            config,
            events_tx,
            workers: Vec::new(),
            queue: TaskQueue::new(),
            pending: HashMap::new(),
            next_task_id: 0,
            next_worker_id: 0,
            total_processed: 0,
            error_count: 0,
            total_processing: Duration::ZERO,
            destroyed: false,
        }
    }

    /// Spawns workers until the configured target size is reached.
    pub fn spawn_workers_to_target(&mut self) {
        while self.workers.len() < self.config.workers && !self.destroyed {
            let id = self.next_worker_id;
            self.next_worker_id += 1;
            self.workers.push(spawn_worker(
                id,
                self.events_tx.clone(),
                self.config.large_payload_bytes,
            ));
            info!(worker_id = id, "Worker added to pool");
        }
    }

    /// Registers an externally built worker handle (test seam).
    #[cfg(test)]
    pub fn add_worker(&mut self, handle: WorkerHandle) {
        self.workers.push(handle);
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // == Enqueue ==
    /// Accepts a task, queues it, and immediately tries to dispatch.
    pub fn enqueue(
        &mut self,
        request: TaskRequest,
        priority: TaskPriority,
        reply: oneshot::Sender<Result<TaskOutput>>,
    ) -> TaskId {
        if self.destroyed {
            let _ = reply.send(Err(Error::PoolDestroyed));
            return 0;
        }

        self.next_task_id += 1;
        let id = self.next_task_id;
        self.pending.insert(
            id,
            PendingTask {
                reply,
                enqueued_at: Instant::now(),
                assigned_to: None,
            },
        );
        self.queue.push(QueuedTask {
            id,
            request,
            priority,
            enqueued_at: Instant::now(),
        });
        debug!(task_id = id, queue_size = self.queue.len(), "Task enqueued");
        self.try_dispatch();
        id
    }

    // == Dispatch ==
    /// Hands queued tasks to idle workers until one side runs out.
    fn try_dispatch(&mut self) {
        loop {
            let Some(idx) = self.workers.iter().position(|w| w.is_idle()) else {
                return;
            };
            let Some(task) = self.queue.pop_next() else {
                return;
            };

            let worker_id = self.workers[idx].id;
            let QueuedTask {
                id: task_id,
                request,
                priority,
                enqueued_at,
            } = task;

            match self.workers[idx].dispatch(WorkerJob { task_id, request }) {
                Ok(()) => {
                    if let Some(pending) = self.pending.get_mut(&task_id) {
                        pending.assigned_to = Some(worker_id);
                    }
                    debug!(task_id, worker_id, "Task dispatched");
                }
                Err(job) => {
                    // Channel gone: the worker died between selection and
                    // dispatch. Drop the handle and put the task back at the
                    // front of its lane; the Exited event drives replacement.
                    self.workers.remove(idx);
                    self.queue.requeue(QueuedTask {
                        id: task_id,
                        request: job.request,
                        priority,
                        enqueued_at,
                    });
                }
            }
        }
    }

    // == Completion ==
    /// A worker reported a result: resolve the caller, free the worker,
    /// and keep dispatching.
    pub fn on_completed(
        &mut self,
        worker_id: WorkerId,
        task_id: TaskId,
        outcome: std::result::Result<TaskOutput, String>,
        processing_time: Duration,
    ) {
        if let Some(worker) = self.workers.iter_mut().find(|w| w.id == worker_id) {
            worker.mark_idle();
        }
        self.total_processed += 1;
        self.total_processing += processing_time;

        match self.pending.remove(&task_id) {
            Some(pending) => {
                let result = outcome.map_err(Error::TaskFailed);
                if result.is_err() {
                    self.error_count += 1;
                }
                let _ = pending.reply.send(result);
            }
            // Reaped or destroyed while in flight; the caller already got
            // an answer
            None => debug!(task_id, "Late completion ignored"),
        }
        self.try_dispatch();
    }

    // == Worker Exit ==
    /// A worker's loop ended outside of shutdown: reject its in-flight
    /// task and report whether a replacement should be scheduled.
    pub fn on_exited(&mut self, worker_id: WorkerId) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(idx) = self.workers.iter().position(|w| w.id == worker_id) else {
            return false;
        };
        self.workers.remove(idx);
        warn!(worker_id, "Worker died, scheduling replacement");

        let in_flight = self
            .pending
            .iter()
            .find(|(_, p)| p.assigned_to == Some(worker_id))
            .map(|(id, _)| *id);
        if let Some(task_id) = in_flight {
            if let Some(pending) = self.pending.remove(&task_id) {
                self.error_count += 1;
                let _ = pending.reply.send(Err(Error::WorkerDied));
            }
        }

        if let Some(hook) = &self.config.on_worker_error {
            hook("worker_exit", &format!("worker {} died", worker_id));
        }
        true
    }

    // == Replacement ==
    /// Restores the pool toward its target size after a cooldown.
    pub fn spawn_replacement(&mut self) {
        if self.destroyed || self.workers.len() >= self.config.workers {
            return;
        }
        self.spawn_workers_to_target();
        self.try_dispatch();
    }

    // == Reaping ==
    /// Rejects every pending task older than the timeout.
    ///
    /// A reaped in-flight task leaves its worker busy until the worker
    /// reports; that late report is then ignored.
    pub fn reap_stale(&mut self, now: Instant) {
        let timeout = self.config.task_timeout;
        let stale: Vec<TaskId> = self
            .pending
            .iter()
            .filter(|(_, p)| now.duration_since(p.enqueued_at) > timeout)
            .map(|(id, _)| *id)
            .collect();

        for task_id in stale {
            self.queue.remove(task_id);
            if let Some(pending) = self.pending.remove(&task_id) {
                self.error_count += 1;
                let _ = pending.reply.send(Err(Error::TaskTimeout));
                warn!(task_id, "Reaped stale task");
            }
        }
    }

    // == Destroy ==
    /// Rejects everything pending and drops every worker handle, which
    /// closes the job channels and ends the worker loops. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        let _ = self.queue.drain_all();
        for (_, pending) in self.pending.drain() {
            let _ = pending.reply.send(Err(Error::PoolDestroyed));
        }
        self.workers.clear();
        info!("Worker pool destroyed");
    }

    // == Stats ==
    pub fn stats(&self) -> PoolStats {
        let avg_processing_time_ms = if self.total_processed > 0 {
            self.total_processing.as_secs_f64() * 1000.0 / self.total_processed as f64
        } else {
            0.0
        };
        PoolStats {
            total_processed: self.total_processed,
            error_count: self.error_count,
            avg_processing_time_ms,
            active_workers: self.workers.len(),
            queue_size: self.queue.len(),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Supervisor plus a fake worker whose job channel the test holds, so
    /// dispatch order is directly observable.
    fn supervisor_with_fake_worker(
        target: usize,
    ) -> (Supervisor, mpsc::Receiver<WorkerJob>, mpsc::Receiver<WorkerEvent>) {
        let (events_tx, events_rx) = mpsc::channel(16);
        let mut sup = Supervisor::new(
            PoolConfig {
                workers: target,
                ..Default::default()
            },
            events_tx,
        );
        let (job_tx, job_rx) = mpsc::channel(8);
        sup.add_worker(WorkerHandle::new(0, job_tx));
        (sup, job_rx, events_rx)
    }

    fn enqueue(
        sup: &mut Supervisor,
        priority: TaskPriority,
    ) -> oneshot::Receiver<Result<TaskOutput>> {
        let (tx, rx) = oneshot::channel();
        sup.enqueue(TaskRequest::Stringify(json!(1)), priority, tx);
        rx
    }

    #[tokio::test]
    async fn test_priority_dispatch_order_when_worker_busy() {
        let (mut sup, mut job_rx, _events) = supervisor_with_fake_worker(1);

        // First task occupies the only worker
        let _first = enqueue(&mut sup, TaskPriority::Normal);
        let first_job = job_rx.try_recv().unwrap();

        // Queued while the worker is busy
        let _low = enqueue(&mut sup, TaskPriority::Low);
        let _high = enqueue(&mut sup, TaskPriority::High);
        let _normal = enqueue(&mut sup, TaskPriority::Normal);
        assert_eq!(sup.stats().queue_size, 3);

        // Completion frees the worker; High must go out first
        sup.on_completed(0, first_job.task_id, Ok(TaskOutput::Text("1".into())), Duration::ZERO);
        let second_job = job_rx.try_recv().unwrap();

        sup.on_completed(0, second_job.task_id, Ok(TaskOutput::Text("1".into())), Duration::ZERO);
        let third_job = job_rx.try_recv().unwrap();

        sup.on_completed(0, third_job.task_id, Ok(TaskOutput::Text("1".into())), Duration::ZERO);
        let fourth_job = job_rx.try_recv().unwrap();

        // Submission ids: first=1, low=2, high=3, normal=4
        assert_eq!(second_job.task_id, 3);
        assert_eq!(third_job.task_id, 4);
        assert_eq!(fourth_job.task_id, 2);
    }

    #[tokio::test]
    async fn test_completion_resolves_caller() {
        let (mut sup, mut job_rx, _events) = supervisor_with_fake_worker(1);

        let rx = enqueue(&mut sup, TaskPriority::Normal);
        let job = job_rx.try_recv().unwrap();
        sup.on_completed(
            0,
            job.task_id,
            Ok(TaskOutput::Text("ok".into())),
            Duration::from_millis(2),
        );

        assert_eq!(rx.await.unwrap().unwrap(), TaskOutput::Text("ok".into()));
        let stats = sup.stats();
        assert_eq!(stats.total_processed, 1);
        assert_eq!(stats.error_count, 0);
        assert!(stats.avg_processing_time_ms > 0.0);
    }

    #[tokio::test]
    async fn test_worker_error_rejects_with_task_failed() {
        let (mut sup, mut job_rx, _events) = supervisor_with_fake_worker(1);

        let rx = enqueue(&mut sup, TaskPriority::Normal);
        let job = job_rx.try_recv().unwrap();
        sup.on_completed(0, job.task_id, Err("bad json".to_string()), Duration::ZERO);

        assert!(matches!(rx.await.unwrap(), Err(Error::TaskFailed(_))));
        assert_eq!(sup.stats().error_count, 1);
    }

    #[tokio::test]
    async fn test_worker_exit_rejects_in_flight_task_and_requests_replacement() {
        let (mut sup, mut job_rx, _events) = supervisor_with_fake_worker(1);
        let reported = Arc::new(AtomicUsize::new(0));
        let hook_counter = reported.clone();
        sup.config.on_worker_error = Some(Arc::new(move |_op, _detail| {
            hook_counter.fetch_add(1, Ordering::SeqCst);
        }));

        let rx = enqueue(&mut sup, TaskPriority::Normal);
        let _job = job_rx.try_recv().unwrap();

        assert!(sup.on_exited(0));
        assert!(matches!(rx.await.unwrap(), Err(Error::WorkerDied)));
        assert_eq!(sup.stats().active_workers, 0);
        assert_eq!(reported.load(Ordering::SeqCst), 1);

        // Cooldown elapsed: the pool restores its target size
        sup.spawn_replacement();
        assert_eq!(sup.stats().active_workers, 1);
    }

    #[tokio::test]
    async fn test_worker_exit_does_not_affect_queued_tasks() {
        let (mut sup, mut job_rx, _events) = supervisor_with_fake_worker(1);

        let _in_flight = enqueue(&mut sup, TaskPriority::Normal);
        let _job = job_rx.try_recv().unwrap();
        let mut queued = enqueue(&mut sup, TaskPriority::Normal);

        sup.on_exited(0);

        // The queued task is still pending, not rejected
        assert!(queued.try_recv().is_err());
        assert_eq!(sup.stats().queue_size, 1);
    }

    #[tokio::test]
    async fn test_reap_stale_rejects_with_timeout() {
        let (events_tx, _events_rx) = mpsc::channel(16);
        let mut sup = Supervisor::new(
            PoolConfig {
                workers: 1,
                task_timeout: Duration::from_millis(5),
                ..Default::default()
            },
            events_tx,
        );
        // No workers: the task stays queued

        let (tx, rx) = oneshot::channel();
        sup.enqueue(TaskRequest::Parse("{}".to_string()), TaskPriority::Normal, tx);

        sup.reap_stale(Instant::now() + Duration::from_millis(10));

        assert!(matches!(rx.await.unwrap(), Err(Error::TaskTimeout)));
        assert_eq!(sup.stats().queue_size, 0);
        assert_eq!(sup.stats().error_count, 1);
    }

    #[tokio::test]
    async fn test_late_completion_after_reap_is_ignored() {
        let (mut sup, mut job_rx, _events) = supervisor_with_fake_worker(1);

        let rx = enqueue(&mut sup, TaskPriority::Normal);
        let job = job_rx.try_recv().unwrap();

        sup.reap_stale(Instant::now() + Duration::from_secs(120));
        assert!(matches!(rx.await.unwrap(), Err(Error::TaskTimeout)));

        // The worker eventually reports; nothing panics, worker goes idle
        sup.on_completed(0, job.task_id, Ok(TaskOutput::Text("x".into())), Duration::ZERO);
        assert_eq!(sup.stats().active_workers, 1);
    }

    #[tokio::test]
    async fn test_destroy_rejects_all_pending() {
        let (mut sup, mut job_rx, _events) = supervisor_with_fake_worker(1);

        let in_flight = enqueue(&mut sup, TaskPriority::Normal);
        let _job = job_rx.try_recv().unwrap();
        let queued_a = enqueue(&mut sup, TaskPriority::Normal);
        let queued_b = enqueue(&mut sup, TaskPriority::Low);

        sup.destroy();
        sup.destroy(); // idempotent

        assert!(matches!(in_flight.await.unwrap(), Err(Error::PoolDestroyed)));
        assert!(matches!(queued_a.await.unwrap(), Err(Error::PoolDestroyed)));
        assert!(matches!(queued_b.await.unwrap(), Err(Error::PoolDestroyed)));
        assert_eq!(sup.stats().active_workers, 0);
        assert_eq!(sup.stats().queue_size, 0);
    }

    #[tokio::test]
    async fn test_enqueue_after_destroy_rejects() {
        let (mut sup, _job_rx, _events) = supervisor_with_fake_worker(1);

        sup.destroy();
        let rx = enqueue(&mut sup, TaskPriority::Normal);

        assert!(matches!(rx.await.unwrap(), Err(Error::PoolDestroyed)));
    }
}
