//! Error types for the service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Error Enum ==
/// Unified error type for the cache, rate limiter, and worker pool.
#[derive(Error, Debug)]
pub enum Error {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Component was constructed with invalid parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request rejected by the rate limiter
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Worker reported an application error (e.g. malformed JSON)
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// Task exceeded the pool's processing timeout
    #[error("Task processing timeout")]
    TaskTimeout,

    /// The worker executing the task died before reporting a result
    #[error("Worker died before completing task")]
    WorkerDied,

    /// The pool was destroyed while the task was pending
    #[error("Pool destroyed")]
    PoolDestroyed,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::KeyNotFound(key) => (StatusCode::NOT_FOUND, format!("Key not found: {}", key)),
            Error::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Error::InvalidConfig(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Error::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            Error::TaskFailed(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Error::TaskTimeout | Error::WorkerDied | Error::PoolDestroyed => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        let mut response = (status, body).into_response();

        // Blocked clients get a concrete retry hint
        if let Error::RateLimited { retry_after_secs } = self {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

// == Result Type Alias ==
/// Convenience Result type for the service.
pub type Result<T> = std::result::Result<T, Error>;
