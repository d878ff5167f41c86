//! API Module
//!
//! HTTP handlers, rate-limit middleware, and routing for the service REST API.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
