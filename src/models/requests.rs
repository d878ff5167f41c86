//! Request DTOs for the service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::pool::TaskPriority;

/// Request body for the cache SET operation (PUT /cache/set)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl SetRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > 256 {
            return Some("Key exceeds maximum length of 256 characters".to_string());
        }
        None
    }
}

/// Request body for the JSON parse operation (POST /json/parse)
#[derive(Debug, Clone, Deserialize)]
pub struct ParseRequest {
    /// Raw JSON text to parse
    pub payload: String,
    /// Optional dispatch priority (defaults to normal)
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

impl ParseRequest {
    pub fn validate(&self) -> Option<String> {
        if self.payload.is_empty() {
            return Some("Payload cannot be empty".to_string());
        }
        None
    }
}

/// Request body for the JSON stringify operation (POST /json/stringify)
#[derive(Debug, Clone, Deserialize)]
pub struct StringifyRequest {
    /// The value to serialize
    pub value: Value,
    /// Optional dispatch priority (defaults to normal)
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}
