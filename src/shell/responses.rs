//! Shell Responses
//!
//! Each command answers with exactly one JSON line built from these types.

use serde::Serialize;

use crate::cache::CacheStats;

/// Any response the shell can print.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Value(ValueResponse),
    Message(MessageResponse),
    Exists(ExistsResponse),
    Keys(KeysResponse),
    Values(ValuesResponse),
    Count(CountResponse),
    Stats(StatsResponse),
    Error(ErrorResponse),
}

impl Response {
    /// Renders the response as a single JSON line.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|err| format!(r#"{{"error":"unserializable response: {}"}}"#, err))
    }
}

/// Response for GET and PEEK; `value` is null when the key is absent
#[derive(Debug, Clone, Serialize)]
pub struct ValueResponse {
    pub key: String,
    pub value: Option<String>,
}

impl ValueResponse {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response for commands that only acknowledge
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn set(key: &str) -> Self {
        Self::new(format!("Key '{}' set successfully", key))
    }

    pub fn deleted(key: &str) -> Self {
        Self::new(format!("Key '{}' deleted successfully", key))
    }
}

/// Response for HAS
#[derive(Debug, Clone, Serialize)]
pub struct ExistsResponse {
    pub key: String,
    pub exists: bool,
}

/// Response for KEYS, most recently used first
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

/// Response for VALUES, in KEYS order
#[derive(Debug, Clone, Serialize)]
pub struct ValuesResponse {
    pub values: Vec<String>,
}

/// Response for LEN, SIZE, PRUNE and EVICT
#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Response for STATS
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl StatsResponse {
    pub fn new(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
