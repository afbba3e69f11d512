//! Cache Service Module
//!
//! Thread-safe handle over the [`CacheStore`] that runs evictions through the
//! active [`EvictionPolicy`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheStore, Eviction, KeyStatsStore, DEFAULT_CANDIDATE_WINDOW};
use crate::eviction::{EvictionPolicy, EvictionStrategy};

// == Put Outcome ==
/// Result of a `put`: the resident count afterwards and any eviction it caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    pub size: usize,
    pub eviction: Option<Eviction>,
}

// == Cache ==
/// Shared cache handle.
///
/// Lock order is the admission gate, then the store lock, then the key
/// statistics lock. The store lock is released while the strategy runs so a
/// slow scorer never blocks reads or overwrites; the decision is re-validated
/// against residency when the lock is taken again.
///
/// New keys are only admitted while holding the gate, and the holder keeps it
/// until its eviction is applied, so at most one entry is ever resident
/// beyond capacity.
#[derive(Debug)]
pub struct Cache {
    store: Mutex<CacheStore>,
    admission: Mutex<()>,
    policy: ArcSwap<EvictionPolicy>,
    stats: Arc<KeyStatsStore>,
    /// Number of tail keys offered to the strategy
    candidate_window: usize,
}

impl Cache {
    // == Constructor ==
    pub fn new(capacity: usize, policy: EvictionPolicy, stats: Arc<KeyStatsStore>) -> Self {
        Self {
            store: Mutex::new(CacheStore::new(capacity)),
            admission: Mutex::new(()),
            policy: ArcSwap::from_pointee(policy),
            stats,
            candidate_window: DEFAULT_CANDIDATE_WINDOW,
        }
    }

    /// Overrides how many of the coldest keys each eviction considers.
    pub fn with_candidate_window(mut self, window: usize) -> Self {
        self.candidate_window = window.max(1);
        self
    }

    pub fn key_stats(&self) -> &Arc<KeyStatsStore> {
        &self.stats
    }

    // == Get ==
    /// Looks up `key`, promoting it and recording the access on a hit.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut store = self.store.lock().await;
        let value = store.get(key)?;
        self.stats.touch(key, value.len() as u64);
        Some(value)
    }

    // == Put ==
    /// Stores `value` under `key`, evicting exactly one entry on overflow.
    pub async fn put(&self, key: String, value: Vec<u8>) -> PutOutcome {
        let size_bytes = value.len() as u64;

        {
            // Overwrites leave the resident count unchanged and skip the gate.
            let mut store = self.store.lock().await;
            if store.contains(&key) {
                store.overwrite(&key, value);
                self.stats.touch(&key, size_bytes);
                return PutOutcome {
                    size: store.len(),
                    eviction: None,
                };
            }
        }

        let _admission = self.admission.lock().await;
        let candidates = {
            let mut store = self.store.lock().await;
            self.stats.touch(&key, size_bytes);
            if !store.put(key, value) {
                return PutOutcome {
                    size: store.len(),
                    eviction: None,
                };
            }
            store.candidates(self.candidate_window)
        };

        // Pinned for the whole eviction; a concurrent swap applies to the next one.
        let policy = self.policy.load_full();
        let decision = policy.choose_victim(&candidates).await;

        // The owed eviction always happens, even if a concurrent removal
        // already made room; a vanished victim falls back to the tail.
        let mut store = self.store.lock().await;
        let eviction = store.evict(decision);

        if let Some(eviction) = &eviction {
            debug!(
                key = %eviction.key,
                reason = ?eviction.reason,
                strategy = policy.name(),
                "Evicted entry"
            );
        }

        PutOutcome {
            size: store.len(),
            eviction,
        }
    }

    // == Remove ==
    /// Removes `key` if resident. Its statistics are kept.
    pub async fn remove(&self, key: &str) -> bool {
        self.store.lock().await.remove(key).is_some()
    }

    // == Contains ==
    pub async fn contains(&self, key: &str) -> bool {
        self.store.lock().await.contains(key)
    }

    // == Size ==
    /// Current resident-key count.
    pub async fn size(&self) -> usize {
        self.store.lock().await.len()
    }

    // == Keys ==
    /// Resident keys, most recently used first.
    pub async fn keys(&self) -> Vec<String> {
        self.store.lock().await.keys()
    }

    pub async fn capacity(&self) -> usize {
        self.store.lock().await.capacity()
    }

    // == Strategy ==
    /// Replaces the active policy for subsequent evictions.
    pub fn set_strategy(&self, policy: EvictionPolicy) {
        let name = policy.name();
        self.policy.store(Arc::new(policy));
        info!(strategy = name, "Eviction strategy replaced");
    }

    pub fn strategy_name(&self) -> &'static str {
        self.policy.load().name()
    }
}
