//! Cache Module
//!
//! Bounded in-memory caching with TTL expiry and LRU eviction. This is the
//! primitive the rate limiter builds on and the HTTP API exposes directly.

mod entry;
mod key;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::canonical_key;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::BoundedCache;
