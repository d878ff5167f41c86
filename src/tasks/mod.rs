//! Background Tasks Module
//!
//! Periodic maintenance that runs alongside the server.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache and limiter entries at configured
//!   intervals

mod sweep;

pub use sweep::spawn_sweep_task;
