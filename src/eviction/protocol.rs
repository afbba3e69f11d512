//! Scoring Sidecar Protocol
//!
//! Wire records and HTTP client for the external reuse scorer.
//!
//! ```text
//! POST /score
//! [{"key": "a", "recency_us": 120, "access_count": 3, "size_bytes": 10, "fetch_cost_ms": 50}]
//!
//! 200 OK
//! [{"key": "a", "reuse_prob": 0.82}]
//! ```

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

// == Wire Records ==
/// Features sent to the scorer for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub key: String,
    pub recency_us: u64,
    pub access_count: u64,
    pub size_bytes: u64,
    pub fetch_cost_ms: u64,
}

/// Scorer verdict for one candidate. Lower `reuse_prob` = more evictable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub reuse_prob: f64,
}

// == Score Error ==
/// Reasons a scoring call produced nothing usable.
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("scoring request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u128 },

    #[error("scoring request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("scorer {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed scorer response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("scorer returned no scores")]
    Empty,
}

// == Scoring Client ==
/// HTTP client for the scorer's `/score` endpoint.
///
/// Connect and read phases are bounded by reqwest; the whole exchange,
/// including writing the request body, is bounded again by a tokio timeout.
#[derive(Debug, Clone)]
pub struct ScoringClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl ScoringClient {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .timeout(timeout)
            .no_proxy()
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    "Failed to build scoring client, connect and read timeouts not applied"
                );
                reqwest::Client::new()
            });

        Self {
            client,
            url: format!("http://{}:{}/score", host, port),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // == Score ==
    /// Sends one scoring request and returns the non-empty list of scores.
    pub async fn score(&self, rows: &[ScoreRequest]) -> Result<Vec<ScoreResponse>, ScoreError> {
        debug!(url = %self.url, candidates = rows.len(), "Requesting eviction scores");

        let exchange = async {
            let response = self
                .client
                .post(&self.url)
                .json(rows)
                .send()
                .await
                .map_err(|source| self.transport_error(source))?;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(ScoreError::Status {
                    url: self.url.clone(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|source| self.transport_error(source))?;
            Ok::<_, ScoreError>(body)
        };

        let body = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ScoreError::Timeout {
                url: self.url.clone(),
                timeout_ms: self.timeout.as_millis(),
            })??;

        let scores: Vec<ScoreResponse> = serde_json::from_slice(&body)?;
        if scores.is_empty() {
            return Err(ScoreError::Empty);
        }
        Ok(scores)
    }

    fn transport_error(&self, source: reqwest::Error) -> ScoreError {
        if source.is_timeout() {
            ScoreError::Timeout {
                url: self.url.clone(),
                timeout_ms: self.timeout.as_millis(),
            }
        } else {
            ScoreError::Transport {
                url: self.url.clone(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_request_wire_format() {
        let row = ScoreRequest {
            key: "k".to_string(),
            recency_us: 120,
            access_count: 3,
            size_bytes: 10,
            fetch_cost_ms: 50,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "key": "k",
                "recency_us": 120,
                "access_count": 3,
                "size_bytes": 10,
                "fetch_cost_ms": 50
            })
        );
    }

    #[test]
    fn test_score_response_missing_fields_default() {
        let rows: Vec<ScoreResponse> =
            serde_json::from_str(r#"[{"reuse_prob": 0.5}, {"key": "a"}]"#).unwrap();
        assert_eq!(rows[0].key, "");
        assert_eq!(rows[1].reuse_prob, 0.0);
    }

    #[test]
    fn test_score_response_rejects_non_array() {
        let parsed = serde_json::from_str::<Vec<ScoreResponse>>(r#"{"key": "a"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_client_url() {
        let client = ScoringClient::new("127.0.0.1", 5000, Duration::from_millis(30));
        assert_eq!(client.url(), "http://127.0.0.1:5000/score");
        assert_eq!(client.timeout(), Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_unreachable_scorer_is_an_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = ScoringClient::new("127.0.0.1", port, Duration::from_millis(30));
        let rows = vec![ScoreRequest {
            key: "a".to_string(),
            recency_us: 1,
            access_count: 1,
            size_bytes: 1,
            fetch_cost_ms: 50,
        }];

        assert!(client.score(&rows).await.is_err());
    }
}
