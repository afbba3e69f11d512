//! Key Statistics Module
//!
//! Per-key access bookkeeping that feeds eviction scoring. Statistics outlive
//! the entries they describe so a re-admitted key keeps its history.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Re-fetch cost assumed for keys that never had one set explicitly
pub const DEFAULT_FETCH_COST_MS: u64 = 50;

// == Key Stats ==
/// Access features recorded for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStats {
    /// Number of successful reads and writes
    pub access_count: u64,
    /// Monotonic timestamp of the last access, in microseconds
    pub last_access_us: u64,
    /// Value size at the last access
    pub size_bytes: u64,
    /// Assumed cost of fetching the value again from origin
    pub fetch_cost_ms: u64,
}

impl Default for KeyStats {
    fn default() -> Self {
        Self {
            access_count: 0,
            last_access_us: 0,
            size_bytes: 0,
            fetch_cost_ms: DEFAULT_FETCH_COST_MS,
        }
    }
}

impl KeyStats {
    /// True once the key has been read or written at least once.
    pub fn observed(&self) -> bool {
        self.access_count > 0
    }
}

// == Key Stats Store ==
/// Thread-safe store of [`KeyStats`], shared by the cache and the strategies.
#[derive(Debug)]
pub struct KeyStatsStore {
    /// Origin of the monotonic microsecond clock
    epoch: Instant,
    stats: Mutex<HashMap<String, KeyStats>>,
}

impl Default for KeyStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStatsStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            stats: Mutex::new(HashMap::new()),
        }
    }

    // == Clock ==
    /// Current monotonic time in microseconds on this store's clock.
    pub fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    // == Touch ==
    /// Records one access to `key` with its current value size.
    pub fn touch(&self, key: &str, size_bytes: u64) {
        let now_us = self.now_us();
        let mut stats = self.lock();
        let entry = stats.entry(key.to_string()).or_default();
        entry.access_count += 1;
        entry.last_access_us = now_us;
        entry.size_bytes = size_bytes;
    }

    // == Fetch Cost ==
    /// Overwrites the assumed re-fetch cost for `key`.
    pub fn set_fetch_cost_ms(&self, key: &str, cost_ms: u64) {
        self.lock().entry(key.to_string()).or_default().fetch_cost_ms = cost_ms;
    }

    // == Snapshot ==
    /// Copies the statistics of the requested keys.
    ///
    /// Keys never observed are absent from the result; defaulting is left to
    /// the consumer.
    pub fn snapshot_of(&self, keys: &[String]) -> HashMap<String, KeyStats> {
        let stats = self.lock();
        keys.iter()
            .filter_map(|key| stats.get(key).map(|s| (key.clone(), *s)))
            .collect()
    }

    // == Prune ==
    /// Drops statistics for keys not accessed within `max_idle`.
    ///
    /// Keys that only carry a fetch cost and were never accessed are kept.
    /// Returns the number of keys dropped.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let now_us = self.now_us();
        let max_idle_us = max_idle.as_micros() as u64;
        let mut stats = self.lock();
        let before = stats.len();
        stats.retain(|_, s| {
            !s.observed() || now_us.saturating_sub(s.last_access_us) <= max_idle_us
        });
        before - stats.len()
    }

    // == Length ==
    /// Returns the number of keys with statistics.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock leaves plain counters behind, still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, KeyStats>> {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_stats_default() {
        let stats = KeyStats::default();
        assert_eq!(stats.access_count, 0);
        assert_eq!(stats.size_bytes, 0);
        assert_eq!(stats.fetch_cost_ms, DEFAULT_FETCH_COST_MS);
        assert!(!stats.observed());
    }

    #[test]
    fn test_touch_then_snapshot() {
        let store = KeyStatsStore::new();
        store.touch("x", 10);

        let snap = store.snapshot_of(&keys(&["x", "y"]));

        assert_eq!(snap.len(), 1);
        let x = snap.get("x").unwrap();
        assert_eq!(x.access_count, 1);
        assert_eq!(x.size_bytes, 10);
        assert_eq!(x.fetch_cost_ms, DEFAULT_FETCH_COST_MS);
        assert!(!snap.contains_key("y"));
    }

    #[test]
    fn test_touch_accumulates() {
        let store = KeyStatsStore::new();
        store.touch("x", 10);
        let first = store.snapshot_of(&keys(&["x"]))["x"];
        thread::sleep(Duration::from_millis(2));
        store.touch("x", 20);
        let second = store.snapshot_of(&keys(&["x"]))["x"];

        assert_eq!(second.access_count, 2);
        assert_eq!(second.size_bytes, 20);
        assert!(second.last_access_us > first.last_access_us);
    }

    #[test]
    fn test_set_fetch_cost() {
        let store = KeyStatsStore::new();
        store.touch("x", 1);
        store.set_fetch_cost_ms("x", 250);
        store.set_fetch_cost_ms("fresh", 7);

        let snap = store.snapshot_of(&keys(&["x", "fresh"]));
        assert_eq!(snap["x"].fetch_cost_ms, 250);
        assert_eq!(snap["x"].access_count, 1);
        assert_eq!(snap["fresh"].fetch_cost_ms, 7);
        assert!(!snap["fresh"].observed());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = KeyStatsStore::new();
        store.touch("x", 1);
        let snap = store.snapshot_of(&keys(&["x"]));
        store.touch("x", 1);

        assert_eq!(snap["x"].access_count, 1);
    }

    #[test]
    fn test_concurrent_touches() {
        let store = Arc::new(KeyStatsStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.touch("shared", 1);
                        store.touch(&format!("own_{}", i), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.snapshot_of(&keys(&["shared"]))["shared"].access_count, 800);
        assert_eq!(store.len(), 9);
    }

    #[test]
    fn test_prune_idle() {
        let store = KeyStatsStore::new();
        store.touch("old", 1);
        store.set_fetch_cost_ms("cost_only", 10);
        thread::sleep(Duration::from_millis(30));
        store.touch("recent", 1);

        let dropped = store.prune_idle(Duration::from_millis(15));

        assert_eq!(dropped, 1);
        let snap = store.snapshot_of(&keys(&["old", "recent", "cost_only"]));
        assert!(!snap.contains_key("old"));
        assert!(snap.contains_key("recent"));
        assert!(snap.contains_key("cost_only"));
    }
}
