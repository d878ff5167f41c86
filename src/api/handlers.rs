//! API Handlers
//!
//! HTTP request handlers for each service endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio::sync::RwLock;

use crate::cache::BoundedCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::limiter::{RateLimiterConfig, SlidingWindowRateLimiter};
use crate::models::{
    CacheStatsResponse, DeleteResponse, GetResponse, HealthResponse, ParseRequest, ParseResponse,
    PoolStatsResponse, SetRequest, SetResponse, StringifyRequest, StringifyResponse,
};
use crate::pool::{PoolConfig, TaskOutput, TaskRequest, WorkerTaskPool};

/// Application state shared across all handlers.
///
/// Every component is constructed explicitly at startup and injected here;
/// there are no module-level singletons, so tests build isolated instances.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<BoundedCache<String>>>,
    /// Thread-safe rate limiter
    pub limiter: Arc<RwLock<SlidingWindowRateLimiter>>,
    /// Worker pool handle (internally a channel, cheap to clone)
    pub pool: WorkerTaskPool,
}

impl AppState {
    /// Creates a new AppState from already-built components.
    pub fn new(
        cache: BoundedCache<String>,
        limiter: SlidingWindowRateLimiter,
        pool: WorkerTaskPool,
    ) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            limiter: Arc::new(RwLock::new(limiter)),
            pool,
        }
    }

    /// Builds all three components from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = BoundedCache::new(
            config.max_entries,
            Duration::from_secs(config.default_ttl_secs),
        );
        let limiter = SlidingWindowRateLimiter::new(RateLimiterConfig {
            max_requests: config.rate_limit_max_requests,
            window: Duration::from_secs(config.rate_limit_window_secs),
            ..Default::default()
        })?;
        let pool = WorkerTaskPool::new(PoolConfig {
            workers: config.pool_workers,
            task_timeout: Duration::from_secs(config.task_timeout_secs),
            reap_interval: Duration::from_secs(config.reap_interval_secs),
            restart_cooldown: Duration::from_millis(config.restart_cooldown_ms),
            large_payload_bytes: config.large_payload_bytes,
            on_worker_error: None,
        })?;
        Ok(Self::new(cache, limiter, pool))
    }
}

/// Handler for PUT /cache/set
///
/// Stores a key-value pair in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(Error::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    cache.set(
        &req.key,
        req.value,
        req.ttl_secs.map(Duration::from_secs),
    );

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: a hit updates LRU order and stats
    let mut cache = state.cache.write().await;
    match cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(Error::KeyNotFound(key)),
    }
}

/// Handler for DELETE /cache/del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    if cache.remove(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(Error::KeyNotFound(key))
    }
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let cache = state.cache.read().await;
    Json(CacheStatsResponse::from(cache.stats()))
}

/// Handler for POST /json/parse
///
/// Offloads the parse to the worker pool and waits for its result.
pub async fn parse_handler(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Result<Json<ParseResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(Error::InvalidRequest(error_msg));
    }

    let output = state
        .pool
        .enqueue(
            TaskRequest::Parse(req.payload),
            req.priority.unwrap_or_default(),
        )
        .await?;

    match output {
        TaskOutput::Parsed(value) => Ok(Json(ParseResponse { value })),
        TaskOutput::Text(_) => Err(Error::Internal("unexpected task output".to_string())),
    }
}

/// Handler for POST /json/stringify
pub async fn stringify_handler(
    State(state): State<AppState>,
    Json(req): Json<StringifyRequest>,
) -> Result<Json<StringifyResponse>> {
    let output = state
        .pool
        .enqueue(
            TaskRequest::Stringify(req.value),
            req.priority.unwrap_or_default(),
        )
        .await?;

    match output {
        TaskOutput::Text(text) => Ok(Json(StringifyResponse { text })),
        TaskOutput::Parsed(_) => Err(Error::Internal("unexpected task output".to_string())),
    }
}

/// Handler for GET /pool/stats
pub async fn pool_stats_handler(State(state): State<AppState>) -> Result<Json<PoolStatsResponse>> {
    let stats = state.pool.stats().await?;
    Ok(Json(PoolStatsResponse::from(stats)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
