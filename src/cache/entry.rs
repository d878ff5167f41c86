//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and access metadata.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cache entry: the stored value plus the metadata the store
/// needs for TTL expiry and LRU ordering.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value, owned by the cache until evicted or read out
    pub value: V,
    /// Creation or last-overwrite timestamp (Unix milliseconds)
    pub inserted_at: u64,
    /// Time-to-live in milliseconds
    pub ttl_ms: u64,
    /// Last successful `get` timestamp (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Number of successful `get` hits, informational only
    pub access_count: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry with the given TTL.
    pub fn new(value: V, ttl_ms: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            inserted_at: now,
            ttl_ms,
            last_accessed_at: now,
            access_count: 0,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry's TTL has elapsed.
    ///
    /// An entry is expired once `now - inserted_at` exceeds its TTL.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading, used by the sweep.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.inserted_at) > self.ttl_ms
    }

    // == Touch ==
    /// Records a successful read: bumps the access counter and timestamp.
    pub fn touch(&mut self) {
        self.last_accessed_at = current_timestamp_ms();
        self.access_count += 1;
    }

    // == Remaining TTL ==
    /// Returns remaining TTL in milliseconds, zero when expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let deadline = self.inserted_at + self.ttl_ms;
        deadline.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
