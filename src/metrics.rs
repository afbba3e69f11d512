//! Metrics Module
//!
//! Request counters and a GET latency histogram, exposed as a JSON snapshot
//! and in Prometheus text format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Upper bounds (µs) of the finite latency buckets; one `+Inf` bucket follows.
pub const LATENCY_BUCKETS_US: [u64; 5] = [100, 300, 1_000, 3_000, 10_000];

const BUCKETS: usize = LATENCY_BUCKETS_US.len() + 1;

// == Metrics ==
/// Process-wide counters, constructed once and shared by handle.
#[derive(Debug, Default)]
pub struct Metrics {
    get_requests: AtomicU64,
    put_requests: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    /// Evictions where the strategy's choice was not applied
    eviction_fallbacks: AtomicU64,
    current_size: AtomicU64,
    get_latency_hist: [AtomicU64; BUCKETS],
    get_latency_sum_us: AtomicU64,
}

impl Metrics {
    // == Constructor ==
    /// Creates a new Metrics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Recorders ==
    pub fn record_get(&self, hit: bool, latency_us: u64) {
        self.get_requests.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        let idx = LATENCY_BUCKETS_US
            .iter()
            .position(|bound| latency_us <= *bound)
            .unwrap_or(BUCKETS - 1);
        self.get_latency_hist[idx].fetch_add(1, Ordering::Relaxed);
        self.get_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
    }

    pub fn record_put(&self) {
        self.put_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the eviction counter, and the fallback counter when the
    /// strategy's choice was not what got evicted.
    pub fn record_eviction(&self, fallback: bool) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.eviction_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn set_current_size(&self, size: usize) {
        self.current_size.store(size as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let hits = load(&self.hits);
        let misses = load(&self.misses);

        let mut histogram = Vec::with_capacity(BUCKETS);
        for (i, bucket) in self.get_latency_hist.iter().enumerate() {
            histogram.push(LatencyBucket {
                le_us: LATENCY_BUCKETS_US.get(i).copied(),
                count: load(bucket),
            });
        }

        MetricsSnapshot {
            get_requests: load(&self.get_requests),
            put_requests: load(&self.put_requests),
            cache_hits: hits,
            cache_misses: misses,
            hit_rate: hit_rate(hits, misses),
            evictions: load(&self.evictions),
            eviction_fallbacks: load(&self.eviction_fallbacks),
            cache_current_size: load(&self.current_size),
            get_latency_histogram_us: histogram,
            get_latency_sum_us: load(&self.get_latency_sum_us),
        }
    }

    // == Prometheus ==
    /// Renders the counters in Prometheus text exposition format.
    pub fn to_prometheus(&self) -> String {
        let snap = self.snapshot();
        let mut out = String::new();

        let mut counter = |name: &str, kind: &str, help: &str, value: u64| {
            let _ = writeln!(out, "# HELP {} {}", name, help);
            let _ = writeln!(out, "# TYPE {} {}", name, kind);
            let _ = writeln!(out, "{} {}", name, value);
        };
        counter("cache_get_requests_total", "counter", "Total GET requests", snap.get_requests);
        counter("cache_put_requests_total", "counter", "Total PUT requests", snap.put_requests);
        counter("cache_hits_total", "counter", "Cache hits", snap.cache_hits);
        counter("cache_misses_total", "counter", "Cache misses", snap.cache_misses);
        counter("cache_evictions_total", "counter", "Entries evicted", snap.evictions);
        counter(
            "cache_eviction_fallbacks_total",
            "counter",
            "Evictions that fell back to the recency tail",
            snap.eviction_fallbacks,
        );
        counter("cache_current_size", "gauge", "Current number of keys", snap.cache_current_size);

        let _ = writeln!(out, "# HELP cache_get_latency_us Latency histogram for GET (us)");
        let _ = writeln!(out, "# TYPE cache_get_latency_us histogram");
        let mut cumulative = 0;
        for bucket in &snap.get_latency_histogram_us {
            cumulative += bucket.count;
            let le = bucket
                .le_us
                .map(|bound| bound.to_string())
                .unwrap_or_else(|| "+Inf".to_string());
            let _ = writeln!(out, "cache_get_latency_us_bucket{{le=\"{}\"}} {}", le, cumulative);
        }
        let _ = writeln!(out, "cache_get_latency_us_sum {}", snap.get_latency_sum_us);
        let _ = writeln!(out, "cache_get_latency_us_count {}", cumulative);
        out
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Snapshot Types ==
/// One latency bucket; `le_us` is None for the `+Inf` bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyBucket {
    pub le_us: Option<u64>,
    pub count: u64,
}

/// Serializable view of [`Metrics`], served by `/stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub get_requests: u64,
    pub put_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// hits / (hits + misses), 0.0 before any GET
    pub hit_rate: f64,
    pub evictions: u64,
    pub eviction_fallbacks: u64,
    pub cache_current_size: u64,
    pub get_latency_histogram_us: Vec<LatencyBucket>,
    pub get_latency_sum_us: u64,
}
