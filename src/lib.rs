//! Reservoir - bounded resource primitives behind a small HTTP API
//!
//! Three components built on one theme, bounded concurrency-safe resource
//! management: an LRU/TTL cache, a sliding-window rate limiter that stores
//! its state in two of those caches, and a fixed-size worker pool for
//! CPU-bound JSON work.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod limiter;
pub mod models;
pub mod pool;
pub mod tasks;

pub use api::AppState;
pub use cache::BoundedCache;
pub use config::Config;
pub use error::{Error, Result};
pub use limiter::SlidingWindowRateLimiter;
pub use pool::WorkerTaskPool;
pub use tasks::spawn_sweep_task;
