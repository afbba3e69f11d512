//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for the GET operation (GET /get)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse, decoding the stored bytes as UTF-8
    pub fn new(key: impl Into<String>, value: &[u8]) -> Self {
        Self {
            key: key.into(),
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }
}

/// Response body for the PUT operation (PUT /put)
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    pub status: String,
    /// Resident keys after the put
    pub size: usize,
    /// Key evicted by this put, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evicted: Option<String>,
}

impl PutResponse {
    pub fn new(size: usize, evicted: Option<String>) -> Self {
        Self {
            status: "ok".to_string(),
            size,
            evicted,
        }
    }
}

/// Acknowledgement naming a key (DELETE /del, PUT /cost)
#[derive(Debug, Clone, Serialize)]
pub struct KeyAckResponse {
    pub status: String,
    pub key: String,
}

impl KeyAckResponse {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            key: key.into(),
        }
    }
}

/// Response body for PUT /strategy
#[derive(Debug, Clone, Serialize)]
pub struct StrategyResponse {
    pub status: String,
    /// Name of the strategy now active
    pub strategy: String,
}

impl StrategyResponse {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            strategy: strategy.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
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
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
