//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from the cache
//! and the rate limiter's internal caches. Memory-bounding only: both
//! components expire lazily on access, so correctness never depends on the
//! sweep running.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::BoundedCache;
use crate::limiter::SlidingWindowRateLimiter;

/// Spawns the periodic expiry sweep.
///
/// Returns a JoinHandle that the shutdown path aborts.
pub fn spawn_sweep_task(
    cache: Arc<RwLock<BoundedCache<String>>>,
    limiter: Arc<RwLock<SlidingWindowRateLimiter>>,
    sweep_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed_cache = {
                let mut cache = cache.write().await;
                cache.sweep_expired()
            };
            let removed_limiter = {
                let mut limiter = limiter.write().await;
                limiter.sweep_expired()
            };

            if removed_cache + removed_limiter > 0 {
                info!(
                    "Expiry sweep removed {} cache entries and {} limiter entries",
                    removed_cache, removed_limiter
                );
            } else {
                debug!("Expiry sweep found nothing to remove");
            }
        }
    })
}
