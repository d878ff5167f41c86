//! Worker Pool Module
//!
//! Executes CPU-bound JSON parse/stringify work on a fixed set of background
//! workers, with priority queuing, stale-task reaping, and automatic
//! replacement of dead workers.

#[allow(clippy::module_inception)]
mod pool;
mod supervisor;
mod task;
mod worker;

// Re-export public types
pub use pool::WorkerTaskPool;
pub use supervisor::{ErrorHook, PoolConfig, PoolStats};
pub use task::{TaskId, TaskOutput, TaskPriority, TaskRequest};
pub use worker::{WorkerId, WorkerState};
