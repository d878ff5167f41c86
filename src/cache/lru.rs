//! LRU Order Tracking
//!
//! Maintains the least-recently-used ordering the store consults when it has
//! to evict. Keys live in a `VecDeque` with the most recently used key at the
//! front, so `touch` and `remove` are O(n) scans. That is a deliberate
//! complexity choice: entry counts are bounded by the store's `max_entries`
//! (thousands, not millions), and the scan keeps the structure trivially
//! correct without an intrusive list.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Tracks key access order for eviction decisions.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Front = most recently used, back = least recently used
    order: VecDeque<String>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    /// Drops a key from the tracking order. No-op for unknown keys.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key, if any.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }

    // == Clear ==
    /// Drops all tracked keys.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }
}
