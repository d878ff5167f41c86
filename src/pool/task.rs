//! Pool Task Types
//!
//! Task identity, payloads, priorities, and the three-lane FIFO queue the
//! supervisor dispatches from.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique task identifier, assigned from a monotonic counter at enqueue.
pub type TaskId = u64;

// == Task Request ==
/// The work a task carries: one JSON operation with its input.
#[derive(Debug, Clone)]
pub enum TaskRequest {
    /// Parse a JSON text into a value
    Parse(String),
    /// Serialize a value into JSON text
    Stringify(Value),
}

impl TaskRequest {
    /// Operation name for logs and error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskRequest::Parse(_) => "parse",
            TaskRequest::Stringify(_) => "stringify",
        }
    }
}

// == Task Output ==
/// The result a worker produces for a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    /// Result of a parse operation
    Parsed(Value),
    /// Result of a stringify operation
    Text(String),
}

// == Task Priority ==
/// Dispatch priority. High drains before Normal, Normal before Low;
/// submission order is preserved within a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Normal,
    Low,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Normal
    }
}

// == Queued Task ==
/// A task waiting in the queue for an idle worker.
#[derive(Debug)]
pub struct QueuedTask {
    pub id: TaskId,
    pub request: TaskRequest,
    pub priority: TaskPriority,
    pub enqueued_at: Instant,
}

// == Task Queue ==
/// Priority queue as three FIFO lanes.
#[derive(Debug, Default)]
pub struct TaskQueue {
    high: VecDeque<QueuedTask>,
    normal: VecDeque<QueuedTask>,
    low: VecDeque<QueuedTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Appends a task to the back of its priority lane.
    pub fn push(&mut self, task: QueuedTask) {
        match task.priority {
            TaskPriority::High => self.high.push_back(task),
            TaskPriority::Normal => self.normal.push_back(task),
            TaskPriority::Low => self.low.push_back(task),
        }
    }

    // == Pop ==
    /// Takes the next task to dispatch: highest non-empty lane, FIFO within.
    pub fn pop_next(&mut self) -> Option<QueuedTask> {
        self.high
            .pop_front()
            .or_else(|| self.normal.pop_front())
            .or_else(|| self.low.pop_front())
    }

    // == Requeue ==
    /// Returns a task to the front of its lane after a failed dispatch, so
    /// it stays ahead of later submissions at the same priority.
    pub fn requeue(&mut self, task: QueuedTask) {
        match task.priority {
            TaskPriority::High => self.high.push_front(task),
            TaskPriority::Normal => self.normal.push_front(task),
            TaskPriority::Low => self.low.push_front(task),
        }
    }

    // == Remove ==
    /// Removes a queued task by id, returning it if it was still queued.
    pub fn remove(&mut self, id: TaskId) -> Option<QueuedTask> {
        for lane in [&mut self.high, &mut self.normal, &mut self.low] {
            if let Some(pos) = lane.iter().position(|t| t.id == id) {
                return lane.remove(pos);
            }
        }
        None
    }

    // == Drain ==
    /// Empties the queue, returning every task in dispatch order.
    pub fn drain_all(&mut self) -> Vec<QueuedTask> {
        let mut all = Vec::with_capacity(self.len());
        all.extend(self.high.drain(..));
        all.extend(self.normal.drain(..));
        all.extend(self.low.drain(..));
        all
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.normal.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
