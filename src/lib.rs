//! Scored Cache - An in-memory cache server with pluggable eviction
//!
//! Capacity-bounded recency cache whose eviction victim can be chosen by an
//! external scoring sidecar, falling back to LRU whenever the sidecar fails.

pub mod access_log;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod eviction;
pub mod metrics;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, KeyStatsStore};
pub use config::Config;
pub use eviction::EvictionPolicy;
pub use tasks::spawn_retention_task;
