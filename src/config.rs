//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CANDIDATE_WINDOW;

/// Which eviction strategy the cache starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Plain least-recently-used
    Lru,
    /// Sidecar-scored with recency fallback
    Ml,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Lru => "lru",
            StrategyKind::Ml => "ml",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lru" | "recency" => Ok(StrategyKind::Lru),
            "ml" | "scored" => Ok(StrategyKind::Ml),
            other => Err(format!("unknown eviction strategy '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of resident keys
    pub capacity: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Strategy active at startup
    pub strategy: StrategyKind,
    /// Scoring sidecar host
    pub scorer_host: String,
    /// Scoring sidecar port
    pub scorer_port: u16,
    /// Per-phase timeout for scoring calls, in milliseconds
    pub scorer_timeout_ms: u64,
    /// Coldest keys offered to the strategy per eviction
    pub candidate_window: usize,
    /// CSV access log path; None disables the log
    pub access_log_path: Option<String>,
    /// Key statistics idle longer than this are dropped; 0 keeps them forever
    pub stats_retention_secs: u64,
    /// How often the retention task runs
    pub stats_prune_interval_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum resident keys (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `EVICTION_STRATEGY` - `lru` or `ml` (default: lru)
    /// - `SCORER_HOST` / `SCORER_PORT` - Scoring sidecar (default: 127.0.0.1:5000)
    /// - `SCORER_TIMEOUT_MS` - Scoring call timeout (default: 30)
    /// - `CANDIDATE_WINDOW` - Eviction candidates per decision (default: 8)
    /// - `ACCESS_LOG_PATH` - CSV access log, empty to disable (default: data/access_log.csv)
    /// - `STATS_RETENTION_SECS` - Key statistics retention, 0 to disable (default: 3600)
    /// - `STATS_PRUNE_INTERVAL_SECS` - Retention task interval (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            strategy: parse_var("EVICTION_STRATEGY").unwrap_or(defaults.strategy),
            scorer_host: env::var("SCORER_HOST").unwrap_or(defaults.scorer_host),
            scorer_port: parse_var("SCORER_PORT").unwrap_or(defaults.scorer_port),
            scorer_timeout_ms: parse_var("SCORER_TIMEOUT_MS")
                .unwrap_or(defaults.scorer_timeout_ms),
            candidate_window: parse_var("CANDIDATE_WINDOW").unwrap_or(defaults.candidate_window),
            access_log_path: match env::var("ACCESS_LOG_PATH") {
                Ok(path) if path.trim().is_empty() => None,
                Ok(path) => Some(path),
                Err(_) => defaults.access_log_path,
            },
            stats_retention_secs: parse_var("STATS_RETENTION_SECS")
                .unwrap_or(defaults.stats_retention_secs),
            stats_prune_interval_secs: parse_var("STATS_PRUNE_INTERVAL_SECS")
                .unwrap_or(defaults.stats_prune_interval_secs),
        }
    }

    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_millis(self.scorer_timeout_ms)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 100,
            server_port: 8080,
            strategy: StrategyKind::Lru,
            scorer_host: "127.0.0.1".to_string(),
            scorer_port: 5000,
            scorer_timeout_ms: 30,
            candidate_window: DEFAULT_CANDIDATE_WINDOW,
            access_log_path: Some("data/access_log.csv".to_string()),
            stats_retention_secs: 3600,
            stats_prune_interval_secs: 60,
        }
    }
}
