//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for cache entries without explicit TTL
    pub default_ttl_secs: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// Requests allowed per rate-limit window
    pub rate_limit_max_requests: u32,
    /// Rate-limit window length in seconds
    pub rate_limit_window_secs: u64,
    /// Number of workers in the JSON task pool
    pub pool_workers: usize,
    /// Age in seconds after which a pending pool task is reaped
    pub task_timeout_secs: u64,
    /// Interval in seconds between stale-task reaper runs
    pub reap_interval_secs: u64,
    /// Cooldown in milliseconds before a dead worker is replaced
    pub restart_cooldown_ms: u64,
    /// Parse payloads above this size take the reader-based parse path
    pub large_payload_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL_SECS` - Default cache TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL_SECS` - Expiry sweep frequency in seconds (default: 60)
    /// - `RATE_LIMIT_MAX_REQUESTS` - Requests per window (default: 100)
    /// - `RATE_LIMIT_WINDOW_SECS` - Window length in seconds (default: 60)
    /// - `POOL_WORKERS` - JSON pool worker count (default: 4)
    /// - `TASK_TIMEOUT_SECS` - Stale-task age limit in seconds (default: 30)
    /// - `REAP_INTERVAL_SECS` - Reaper frequency in seconds (default: 10)
    /// - `RESTART_COOLDOWN_MS` - Worker replacement cooldown in ms (default: 1000)
    /// - `LARGE_PAYLOAD_BYTES` - Reader-parse threshold (default: 1 MiB)
    pub fn from_env() -> Self {
        Self {
            max_entries: env_or("MAX_ENTRIES", 1000),
            default_ttl_secs: env_or("DEFAULT_TTL_SECS", 300),
            server_port: env_or("SERVER_PORT", 3000),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", 60),
            rate_limit_max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", 100),
            rate_limit_window_secs: env_or("RATE_LIMIT_WINDOW_SECS", 60),
            pool_workers: env_or("POOL_WORKERS", 4),
            task_timeout_secs: env_or("TASK_TIMEOUT_SECS", 30),
            reap_interval_secs: env_or("REAP_INTERVAL_SECS", 10),
            restart_cooldown_ms: env_or("RESTART_COOLDOWN_MS", 1000),
            large_payload_bytes: env_or("LARGE_PAYLOAD_BYTES", 1024 * 1024),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_secs: 300,
            server_port: 3000,
            sweep_interval_secs: 60,
            rate_limit_max_requests: 100,
            rate_limit_window_secs: 60,
            pool_workers: 4,
            task_timeout_secs: 30,
            reap_interval_secs: 10,
            restart_cooldown_ms: 1000,
            large_payload_bytes: 1024 * 1024,
        }
    }
}
