//! Bounded Cache Store
//!
//! The core engine: HashMap storage combined with LRU eviction and lazy TTL
//! expiry. Holds at most `max_entries` live pairs; inserting past capacity
//! evicts exactly one least-recently-used entry first. Expiry is enforced on
//! every `get`/`has`, so the periodic sweep only bounds memory for entries
//! that are never read again.
//!
//! Values are handed out by clone; no internal entry ever escapes by
//! reference, so external code cannot bypass stats or eviction bookkeeping.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::entry::{current_timestamp_ms, CacheEntry};
use crate::cache::key::canonical_key;
use crate::cache::{CacheStats, LruTracker};

// == Bounded Cache ==
/// Size- and time-bounded key/value store with LRU eviction.
#[derive(Debug)]
pub struct BoundedCache<V> {
    /// Key-value storage, keyed by canonical key string
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance counters
    stats: CacheStats,
    /// Maximum number of live entries
    max_entries: usize,
    /// TTL applied when `set` is called without one
    default_ttl_ms: u64,
}

impl<V: Clone> BoundedCache<V> {
    // == Constructor ==
    /// Creates a new cache holding at most `max_entries` entries.
    ///
    /// # Panics
    /// Panics if `max_entries` is zero; a zero-capacity cache is a
    /// programmer error and fails fast rather than at use time.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        assert!(max_entries > 0, "cache capacity must be non-zero");
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl_ms: default_ttl.as_millis() as u64,
        }
    }

    // == Set ==
    /// Inserts or overwrites a key-value pair.
    ///
    /// An overwrite resets the entry's TTL clock. When the cache is at
    /// capacity and the key is new, the least recently used entry is evicted
    /// first. Always succeeds; keys and values are opaque to the store.
    pub fn set<K: Serialize + ?Sized>(&mut self, key: &K, value: V, ttl: Option<Duration>) {
        let key = canonical_key(key);
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                debug!(key = %evicted, "Evicted least recently used entry");
            }
        }

        let ttl_ms = ttl.map(|d| d.as_millis() as u64).unwrap_or(self.default_ttl_ms);
        self.entries.insert(key.clone(), CacheEntry::new(value, ttl_ms));
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a copy of the value for a key.
    ///
    /// An expired entry is removed on the spot and reported as a miss;
    /// a live hit updates the entry's access metadata and LRU position.
    pub fn get<K: Serialize + ?Sized>(&mut self, key: &K) -> Option<V> {
        let key = canonical_key(key);
        match self.entries.get_mut(&key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(&key);
                self.lru.remove(&key);
                self.stats.record_expiration();
                self.stats.record_miss();
                self.stats.set_total_entries(self.entries.len());
                debug!(key = %key, "Entry expired on access");
                None
            }
            Some(entry) => {
                entry.touch();
                let value = entry.value.clone();
                self.lru.touch(&key);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Checks for a live entry without disturbing its LRU position.
    ///
    /// Applies the same expiry rule as `get` (an expired entry is removed and
    /// counted), but a live entry's access metadata and the hit/miss counters
    /// stay untouched. This is the side-effect-free existence check used for
    /// block-list lookups.
    pub fn has<K: Serialize + ?Sized>(&mut self, key: &K) -> bool {
        let key = canonical_key(key);
        match self.entries.get(&key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(&key);
                self.lru.remove(&key);
                self.stats.record_expiration();
                self.stats.set_total_entries(self.entries.len());
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    // == Remove ==
    /// Removes an entry. Returns whether the key was present.
    pub fn remove<K: Serialize + ?Sized>(&mut self, key: &K) -> bool {
        let key = canonical_key(key);
        if self.entries.remove(&key).is_some() {
            self.lru.remove(&key);
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Drops all entries and resets statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats = CacheStats::new();
    }

    // == Sweep Expired ==
    /// Removes every expired entry in one pass.
    ///
    /// Returns the number of entries removed. Called by the background sweep
    /// task; correctness never depends on it since `get`/`has` expire lazily.
    pub fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expiration();
        }
        self.stats.set_total_entries(self.entries.len());
        expired.len()
    }

    // == Destroy ==
    /// Drops all storage. Safe to call multiple times.
    pub fn destroy(&mut self) {
        self.clear();
    }

    // == Length ==
    /// Current live entry count (stale-but-unswept entries included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}
