//! Eviction Module
//!
//! Strategies that pick a victim among the coldest resident keys.
//!
//! # Strategies
//! - `lru` - [`RecencyStrategy`], evicts the coldest candidate
//! - `ml` - [`ScoredStrategy`], evicts the candidate the scoring sidecar
//!   rates least likely to be reused, declining on any sidecar failure

mod protocol;
mod recency;
mod scored;

use async_trait::async_trait;

pub use protocol::{ScoreError, ScoreRequest, ScoreResponse, ScoringClient};
pub use recency::RecencyStrategy;
pub use scored::{ScoredStrategy, UNOBSERVED_RECENCY_US};

// == Decision ==
/// Outcome of asking a strategy for a victim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Evict this key
    Evict(String),
    /// No opinion; the cache falls back to evicting its tail
    Decline,
}

// == Strategy Interface ==
/// Chooses an eviction victim.
///
/// `candidates` are ordered coldest first, so the least recently used key is
/// `candidates[0]`. Implementations never fail: any problem is expressed as
/// [`Decision::Decline`].
#[async_trait]
pub trait EvictionStrategy: Send + Sync {
    async fn choose_victim(&self, candidates: &[String]) -> Decision;

    /// Short name used in configuration, logs and the HTTP API.
    fn name(&self) -> &'static str;
}

// == Eviction Policy ==
/// The closed set of strategies the cache can run with.
#[derive(Debug)]
pub enum EvictionPolicy {
    Recency(RecencyStrategy),
    Scored(ScoredStrategy),
}

impl EvictionPolicy {
    /// Recency policy, the deterministic default.
    pub fn recency() -> Self {
        EvictionPolicy::Recency(RecencyStrategy)
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::recency()
    }
}

#[async_trait]
impl EvictionStrategy for EvictionPolicy {
    async fn choose_victim(&self, candidates: &[String]) -> Decision {
        match self {
            EvictionPolicy::Recency(strategy) => strategy.choose_victim(candidates).await,
            EvictionPolicy::Scored(strategy) => strategy.choose_victim(candidates).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            EvictionPolicy::Recency(strategy) => strategy.name(),
            EvictionPolicy::Scored(strategy) => strategy.name(),
        }
    }
}
