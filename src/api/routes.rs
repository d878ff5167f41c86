//! API Routes
//!
//! Configures the axum router with all service endpoints.
//!
//! # Endpoints
//! - `PUT /cache/set` - Store a key-value pair
//! - `GET /cache/get/:key` - Retrieve a value by key
//! - `DELETE /cache/del/:key` - Delete a key
//! - `GET /cache/stats` - Cache statistics
//! - `POST /json/parse` - Parse JSON text on the worker pool
//! - `POST /json/stringify` - Serialize a value on the worker pool
//! - `GET /pool/stats` - Worker pool statistics
//! - `GET /health` - Health check (never rate limited)

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, delete_handler, get_handler, health_handler, parse_handler,
    pool_stats_handler, set_handler, stringify_handler, AppState,
};
use super::middleware::rate_limit_middleware;

/// Creates the main router with all endpoints configured.
///
/// The rate-limit middleware wraps every data endpoint; `/health` is added
/// after the layer so probes never consume budget.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache/set", put(set_handler))
        .route("/cache/get/:key", get(get_handler))
        .route("/cache/del/:key", delete(delete_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/json/parse", post(parse_handler))
        .route("/json/stringify", post(stringify_handler))
        .route("/pool/stats", get(pool_stats_handler))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
