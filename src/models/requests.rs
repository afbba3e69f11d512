//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::{MAX_KEY_LENGTH, MAX_VALUE_SIZE};

/// Validates a cache key, returning an error message if it is unusable.
fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Request body for the PUT operation (PUT /put)
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
}

impl PutRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(msg) = validate_key(&self.key) {
            return Some(msg);
        }
        if self.value.len() > MAX_VALUE_SIZE {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            ));
        }
        None
    }
}

/// Query string carrying a key (`GET /get?key=`, `DELETE /del?key=`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

impl KeyQuery {
    /// Returns the key, or an error message when it is missing or invalid.
    pub fn into_key(self) -> Result<String, String> {
        let key = self.key.ok_or_else(|| "missing key".to_string())?;
        match validate_key(&key) {
            Some(msg) => Err(msg),
            None => Ok(key),
        }
    }
}

/// Request body for switching strategy (PUT /strategy)
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyRequest {
    /// `lru` or `ml`
    pub strategy: String,
}

/// Request body for setting a key's re-fetch cost (PUT /cost)
#[derive(Debug, Clone, Deserialize)]
pub struct FetchCostRequest {
    pub key: String,
    pub fetch_cost_ms: u64,
}

impl FetchCostRequest {
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: PutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
    }

    #[test]
    fn test_put_request_requires_value() {
        let json = r#"{"key": "test"}"#;
        assert!(serde_json::from_str::<PutRequest>(json).is_err());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = PutRequest {
            key: "".to_string(),
            value: "test".to_string(),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        let req = PutRequest {
            key: "x".repeat(MAX_KEY_LENGTH + 1),
            value: "test".to_string(),
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = PutRequest {
            key: "valid_key".to_string(),
            value: "test".to_string(),
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_key_query() {
        assert_eq!(
            KeyQuery { key: Some("k".to_string()) }.into_key(),
            Ok("k".to_string())
        );
        assert!(KeyQuery { key: None }.into_key().is_err());
        assert!(KeyQuery { key: Some(String::new()) }.into_key().is_err());
    }

    #[test]
    fn test_fetch_cost_request_deserialize() {
        let json = r#"{"key": "k", "fetch_cost_ms": 120}"#;
        let req: FetchCostRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.fetch_cost_ms, 120);
        assert!(req.validate().is_none());
    }
}
