//! Cache Module
//!
//! Provides the capacity-bounded in-memory cache, its recency order and the
//! per-key statistics that feed eviction scoring.

mod entry;
mod key_stats;
mod recency;
mod service;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key_stats::{KeyStats, KeyStatsStore, DEFAULT_FETCH_COST_MS};
pub use recency::RecencyList;
pub use service::{Cache, PutOutcome};
pub use store::{CacheStore, Eviction, EvictionReason};

// == Public Constants ==
/// Number of coldest keys offered to the eviction strategy by default
pub const DEFAULT_CANDIDATE_WINDOW: usize = 8;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
