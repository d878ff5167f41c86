//! Rate Limiter Module
//!
//! Sliding-window request limiting built on the bounded cache primitive.
//! The limiter core has no HTTP dependency; the API layer wires it into
//! middleware and headers.

mod sliding;
mod window;

// Re-export public types
pub use sliding::{LimitCallback, LimitDecision, RateLimiterConfig, SlidingWindowRateLimiter};
pub use window::RateLimitWindow;
