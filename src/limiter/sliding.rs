//! Sliding Window Rate Limiter
//!
//! Per-key request counting with fixed-window blocking, built on two
//! [`BoundedCache`] instances: one holding the window counters and one
//! holding blocked keys. The "sliding" window actually resets in place when
//! its age exceeds the configured length rather than sliding continuously; a
//! deliberate simplification that keeps the state per key to a single
//! counter.
//!
//! The limiter is single-process: counters live in this process only, and
//! coordinating a budget across processes needs an external atomic store
//! this type does not talk to. Callers wanting cross-instance limits must
//! put one limiter in front of all traffic.
//!
//! `check_limit` takes `&mut self`, so a shared instance behind a lock
//! serializes concurrent increments for the same key by construction.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::BoundedCache;
use crate::error::{Error, Result};
use crate::limiter::window::RateLimitWindow;

/// Callback fired once per transition into the blocked state.
pub type LimitCallback = Arc<dyn Fn(&str, &LimitDecision) + Send + Sync>;

// == Config ==
/// Rate limiter construction parameters.
#[derive(Clone)]
pub struct RateLimiterConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Upper bound on simultaneously tracked keys per internal cache
    pub key_capacity: usize,
    /// Invoked with the key and decision when a key transitions to blocked
    pub on_limit_reached: Option<LimitCallback>,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            key_capacity: 10_000,
            on_limit_reached: None,
        }
    }
}

// == Decision ==
/// Outcome of a single `check_limit` call.
#[derive(Debug, Clone, Serialize)]
pub struct LimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Requests left in the current window (0 when rejected)
    pub remaining: u32,
    /// Seconds until the caller should retry, present only when rejected
    pub retry_after_secs: Option<u64>,
    /// When the current window or block ends (Unix milliseconds)
    pub reset_at_ms: u64,
}

// == Sliding Window Rate Limiter ==
/// Decides whether a keyed request fits the `max_requests` per `window`
/// budget, blocking overflowing keys for one full window.
pub struct SlidingWindowRateLimiter {
    config: RateLimiterConfig,
    window_ms: u64,
    /// Per-key window counters
    counts: BoundedCache<RateLimitWindow>,
    /// Keys currently blocked, mapped to their block deadline (Unix ms)
    blocked: BoundedCache<u64>,
}

impl SlidingWindowRateLimiter {
    // == Constructor ==
    /// Creates a limiter, failing fast on degenerate parameters.
    pub fn new(config: RateLimiterConfig) -> Result<Self> {
        if config.window.is_zero() {
            return Err(Error::InvalidConfig(
                "rate limit window must be non-zero".to_string(),
            ));
        }
        if config.max_requests == 0 {
            return Err(Error::InvalidConfig(
                "rate limit budget must be non-zero".to_string(),
            ));
        }
        if config.key_capacity == 0 {
            return Err(Error::InvalidConfig(
                "rate limiter key capacity must be non-zero".to_string(),
            ));
        }

        let window_ms = config.window.as_millis() as u64;
        Ok(Self {
            counts: BoundedCache::new(config.key_capacity, config.window * 2),
            blocked: BoundedCache::new(config.key_capacity, config.window),
            window_ms,
            config,
        })
    }

    // == Check Limit ==
    /// Counts the request against `key`'s budget and decides its fate.
    ///
    /// A key with an active block is rejected on a fast path that never
    /// consults or mutates its window counter. Otherwise the window is
    /// fetched (resetting it if stale), the counter incremented, and an
    /// overflowing key is blocked until a full window from now.
    pub fn check_limit(&mut self, key: &str) -> LimitDecision {
        let now = crate::cache::current_timestamp_ms();

        // Fast rejection path for blocked keys
        if let Some(blocked_until) = self.blocked.get(key) {
            if now < blocked_until {
                return LimitDecision {
                    allowed: false,
                    remaining: 0,
                    retry_after_secs: Some(ceil_secs(blocked_until - now)),
                    reset_at_ms: blocked_until,
                };
            }
            self.blocked.remove(key);
        }

        let mut window = self
            .counts
            .get(key)
            .unwrap_or_else(|| RateLimitWindow::new(now));
        if window.is_stale(now, self.window_ms) {
            window.reset(now);
        }
        window.count += 1;

        if window.count > self.config.max_requests {
            let blocked_until = now + self.window_ms;
            self.blocked
                .set(key, blocked_until, Some(self.config.window));
            self.counts
                .set(key, window, Some(self.config.window * 2));
            debug!(key = %key, blocked_until, "Key exceeded budget, blocking");

            let decision = LimitDecision {
                allowed: false,
                remaining: 0,
                retry_after_secs: Some(ceil_secs(self.window_ms)),
                reset_at_ms: blocked_until,
            };
            if let Some(callback) = &self.config.on_limit_reached {
                callback(key, &decision);
            }
            return decision;
        }

        let remaining = self.config.max_requests - window.count;
        let reset_at_ms = window.window_start + self.window_ms;
        self.counts.set(key, window, Some(self.config.window * 2));

        LimitDecision {
            allowed: true,
            remaining,
            retry_after_secs: None,
            reset_at_ms,
        }
    }

    /// Requests allowed per window, for response headers.
    pub fn max_requests(&self) -> u32 {
        self.config.max_requests
    }

    // == Sweep ==
    /// Sweeps expired entries out of both internal caches.
    ///
    /// Memory-bounding only; `check_limit` is correct without it.
    pub fn sweep_expired(&mut self) -> usize {
        self.counts.sweep_expired() + self.blocked.sweep_expired()
    }

    // == Destroy ==
    /// Releases both internal caches. Safe to call multiple times.
    pub fn destroy(&mut self) {
        self.counts.destroy();
        self.blocked.destroy();
    }

    #[cfg(test)]
    fn window_count(&mut self, key: &str) -> Option<u32> {
        self.counts.get(key).map(|w| w.count)
    }

    #[cfg(test)]
    fn force_block(&mut self, key: &str, blocked_until: u64) {
        self.blocked.set(key, blocked_until, Some(self.config.window));
    }
}

/// Milliseconds to whole seconds, rounding up.
fn ceil_secs(ms: u64) -> u64 {
    ms.div_ceil(1000)
}
