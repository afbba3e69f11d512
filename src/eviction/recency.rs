//! Recency Strategy
//!
//! Deterministic least-recently-used choice. No I/O, cannot fail.

use async_trait::async_trait;

use super::{Decision, EvictionStrategy};

/// Always evicts the coldest candidate, which comes first in the slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecencyStrategy;

#[async_trait]
impl EvictionStrategy for RecencyStrategy {
    async fn choose_victim(&self, candidates: &[String]) -> Decision {
        match candidates.first() {
            Some(coldest) => Decision::Evict(coldest.clone()),
            None => Decision::Decline,
        }
    }

    fn name(&self) -> &'static str {
        "lru"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recency_declines_on_empty() {
        assert_eq!(RecencyStrategy.choose_victim(&[]).await, Decision::Decline);
    }

    #[tokio::test]
    async fn test_recency_picks_coldest() {
        let candidates: Vec<String> = ["k1", "k2", "k3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            RecencyStrategy.choose_victim(&candidates).await,
            Decision::Evict("k1".to_string())
        );
    }
}
