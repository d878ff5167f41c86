//! Rate Limit Window
//!
//! The per-key counter value stored in the limiter's counts cache.

// == Rate Limit Window ==
/// Request count for one key over the current fixed window.
#[derive(Debug, Clone)]
pub struct RateLimitWindow {
    /// Requests observed in the current window
    pub count: u32,
    /// Window start timestamp (Unix milliseconds)
    pub window_start: u64,
}

impl RateLimitWindow {
    /// Creates a fresh window starting now.
    pub fn new(now_ms: u64) -> Self {
        Self {
            count: 0,
            window_start: now_ms,
        }
    }

    /// True once the window's age exceeds its configured length.
    pub fn is_stale(&self, now_ms: u64, window_ms: u64) -> bool {
        now_ms.saturating_sub(self.window_start) > window_ms
    }

    /// Resets the counter and restarts the window at `now_ms`.
    pub fn reset(&mut self, now_ms: u64) {
        self.count = 0;
        self.window_start = now_ms;
    }
}
