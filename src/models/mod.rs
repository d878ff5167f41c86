//! Models Module
//!
//! Request and response DTOs for the HTTP API.

mod requests;
mod responses;

pub use requests::{ParseRequest, SetRequest, StringifyRequest};
pub use responses::{
    CacheStatsResponse, DeleteResponse, GetResponse, HealthResponse, ParseResponse,
    PoolStatsResponse, SetResponse, StringifyResponse,
};
