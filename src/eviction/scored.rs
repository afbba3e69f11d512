//! Scored Strategy
//!
//! Evicts the candidate the scoring sidecar considers least likely to be
//! reused. Strictly advisory: every failure is a decline, and the cache then
//! falls back to recency eviction.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Decision, EvictionStrategy, ScoreRequest, ScoreResponse, ScoringClient};
use crate::cache::{KeyStats, KeyStatsStore};

/// Recency reported for keys with no recorded access ("extremely stale").
pub const UNOBSERVED_RECENCY_US: u64 = 1_000_000_000_000;

/// Sidecar-scored eviction.
#[derive(Debug, Clone)]
pub struct ScoredStrategy {
    client: ScoringClient,
    stats: Arc<KeyStatsStore>,
}

impl ScoredStrategy {
    pub fn new(client: ScoringClient, stats: Arc<KeyStatsStore>) -> Self {
        Self { client, stats }
    }

    // == Features ==
    /// Builds one scoring row per candidate from a statistics snapshot.
    pub fn features(&self, candidates: &[String]) -> Vec<ScoreRequest> {
        let snapshot = self.stats.snapshot_of(candidates);
        let now_us = self.stats.now_us();

        candidates
            .iter()
            .map(|key| {
                let stats = snapshot.get(key).copied().unwrap_or_default();
                ScoreRequest {
                    key: key.clone(),
                    recency_us: recency_us(&stats, now_us),
                    access_count: stats.access_count,
                    size_bytes: stats.size_bytes,
                    fetch_cost_ms: stats.fetch_cost_ms,
                }
            })
            .collect()
    }
}

fn recency_us(stats: &KeyStats, now_us: u64) -> u64 {
    if stats.observed() {
        now_us.saturating_sub(stats.last_access_us)
    } else {
        UNOBSERVED_RECENCY_US
    }
}

/// Lowest `reuse_prob` among rows naming a candidate; first occurrence wins ties.
fn least_reusable(scores: &[ScoreResponse], candidates: &[String]) -> Option<String> {
    let allowed: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    let mut best: Option<&ScoreResponse> = None;

    for row in scores {
        if row.key.is_empty() || !allowed.contains(row.key.as_str()) {
            continue;
        }
        match best {
            Some(current) if row.reuse_prob >= current.reuse_prob => {}
            _ => best = Some(row),
        }
    }

    best.map(|row| row.key.clone())
}

#[async_trait]
impl EvictionStrategy for ScoredStrategy {
    async fn choose_victim(&self, candidates: &[String]) -> Decision {
        if candidates.is_empty() {
            return Decision::Decline;
        }

        let rows = self.features(candidates);
        let scores = match self.client.score(&rows).await {
            Ok(scores) => scores,
            Err(e) => {
                debug!(error = %e, "Scorer unavailable, declining eviction choice");
                return Decision::Decline;
            }
        };

        match least_reusable(&scores, candidates) {
            Some(victim) => {
                debug!(victim = %victim, "Scorer chose eviction victim");
                Decision::Evict(victim)
            }
            None => {
                debug!("Scorer returned no usable candidate, declining");
                Decision::Decline
            }
        }
    }

    fn name(&self) -> &'static str {
        "ml"
    }
}
