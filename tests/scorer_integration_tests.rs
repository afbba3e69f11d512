//! Integration Tests for Scored Eviction
//!
//! Runs the cache against a mock scoring sidecar served by axum on an
//! ephemeral port.

use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use scored_cache::{
    cache::{Cache, EvictionReason, KeyStatsStore, PutOutcome},
    eviction::{EvictionPolicy, ScoreRequest, ScoredStrategy, ScoringClient},
};
use serde_json::{json, Value};

// == Mock Scorer ==

#[derive(Clone)]
enum Behavior {
    /// Scores every key 0.9 except the named one, which gets 0.1.
    Prefer(&'static str),
    Status(StatusCode),
    Raw(&'static str),
    Slow(Duration),
    /// Removes the preferred key from the cache before answering.
    RemoveThenPrefer(&'static str),
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<Vec<ScoreRequest>>>>,
    cache: Arc<OnceLock<Arc<Cache>>>,
}

fn prefer(rows: &[ScoreRequest], victim: &str) -> Value {
    let scores: Vec<Value> = rows
        .iter()
        .map(|row| {
            let reuse_prob = if row.key == victim { 0.1 } else { 0.9 };
            json!({ "key": row.key, "reuse_prob": reuse_prob })
        })
        .collect();
    Value::Array(scores)
}

async fn score_handler(
    State(state): State<MockState>,
    Json(rows): Json<Vec<ScoreRequest>>,
) -> axum::response::Response {
    state.requests.lock().unwrap().push(rows.clone());

    match state.behavior {
        Behavior::Prefer(victim) => Json(prefer(&rows, victim)).into_response(),
        Behavior::Status(status) => status.into_response(),
        Behavior::Raw(body) => (StatusCode::OK, body).into_response(),
        Behavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(prefer(&rows, "unused")).into_response()
        }
        Behavior::RemoveThenPrefer(victim) => {
            if let Some(cache) = state.cache.get() {
                cache.remove(victim).await;
            }
            Json(prefer(&rows, victim)).into_response()
        }
    }
}

struct Harness {
    cache: Arc<Cache>,
    requests: Arc<Mutex<Vec<Vec<ScoreRequest>>>>,
}

async fn spawn_scorer(
    behavior: Behavior,
    cache_slot: Arc<OnceLock<Arc<Cache>>>,
) -> (u16, Arc<Mutex<Vec<Vec<ScoreRequest>>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        behavior,
        requests: Arc::clone(&requests),
        cache: cache_slot,
    };
    let app = Router::new()
        .route("/score", post(score_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (port, requests)
}

async fn harness(capacity: usize, behavior: Behavior, timeout: Duration) -> Harness {
    let slot = Arc::new(OnceLock::new());
    let (port, requests) = spawn_scorer(behavior, Arc::clone(&slot)).await;

    let stats = Arc::new(KeyStatsStore::new());
    let policy = EvictionPolicy::Scored(ScoredStrategy::new(
        ScoringClient::new("127.0.0.1", port, timeout),
        Arc::clone(&stats),
    ));
    let cache = Arc::new(Cache::new(capacity, policy, stats));
    let _ = slot.set(Arc::clone(&cache));

    Harness { cache, requests }
}

const GENEROUS: Duration = Duration::from_secs(2);

async fn put(cache: &Cache, key: &str) -> PutOutcome {
    cache.put(key.to_string(), b"value".to_vec()).await
}

async fn fill(cache: &Cache, keys: &[&str]) -> Option<PutOutcome> {
    let mut last = None;
    for key in keys {
        last = Some(put(cache, key).await);
    }
    last
}

async fn sorted_keys(cache: &Cache) -> Vec<String> {
    let mut keys = cache.keys().await;
    keys.sort();
    keys
}

// == Scorer Choice ==

#[tokio::test]
async fn test_scorer_chooses_non_tail_victim() {
    let h = harness(3, Behavior::Prefer("b"), GENEROUS).await;

    let outcome = fill(&h.cache, &["a", "b", "c", "d"]).await.unwrap();

    let eviction = outcome.eviction.unwrap();
    assert_eq!(eviction.key, "b");
    assert_eq!(eviction.reason, EvictionReason::Chosen);
    assert_eq!(outcome.size, 3);
    assert_eq!(sorted_keys(&h.cache).await, vec!["a", "c", "d"]);
}

#[tokio::test]
async fn test_scorer_receives_coldest_first_features() {
    let h = harness(3, Behavior::Prefer("a"), GENEROUS).await;

    fill(&h.cache, &["a", "b", "c"]).await;
    h.cache.get("b").await;
    h.cache.key_stats().set_fetch_cost_ms("c", 200);
    put(&h.cache, "d").await;

    let requests = h.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let rows = &requests[0];

    let keys: Vec<&str> = rows.iter().map(|row| row.key.as_str()).collect();
    assert_eq!(keys, vec!["a", "c", "b", "d"]);

    let row = |key: &str| rows.iter().find(|row| row.key == key).unwrap();
    assert_eq!(row("a").access_count, 1);
    assert_eq!(row("b").access_count, 2);
    assert_eq!(row("b").size_bytes, 5);
    assert_eq!(row("c").fetch_cost_ms, 200);
    assert_eq!(row("a").fetch_cost_ms, 50);
    assert!(row("a").recency_us >= row("d").recency_us);
}

// == Fallbacks ==

#[tokio::test]
async fn test_http_error_falls_back_to_tail() {
    let h = harness(3, Behavior::Status(StatusCode::INTERNAL_SERVER_ERROR), GENEROUS).await;

    let outcome = fill(&h.cache, &["a", "b", "c", "d"]).await.unwrap();

    let eviction = outcome.eviction.unwrap();
    assert_eq!(eviction.key, "a");
    assert_eq!(eviction.reason, EvictionReason::Declined);
    assert_eq!(h.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_body_falls_back_to_tail() {
    let h = harness(2, Behavior::Raw("{not json"), GENEROUS).await;

    let outcome = fill(&h.cache, &["a", "b", "c"]).await.unwrap();

    let eviction = outcome.eviction.unwrap();
    assert_eq!(eviction.key, "a");
    assert_eq!(eviction.reason, EvictionReason::Declined);
}

#[tokio::test]
async fn test_empty_scores_fall_back_to_tail() {
    let h = harness(2, Behavior::Raw("[]"), GENEROUS).await;

    let outcome = fill(&h.cache, &["a", "b", "c"]).await.unwrap();

    assert_eq!(outcome.eviction.unwrap().reason, EvictionReason::Declined);
    assert_eq!(sorted_keys(&h.cache).await, vec!["b", "c"]);
}

#[tokio::test]
async fn test_unknown_keys_are_ignored() {
    let h = harness(
        2,
        Behavior::Raw(r#"[{"key":"ghost","reuse_prob":0.0},{"key":"b","reuse_prob":0.4},{"key":"a","reuse_prob":0.7}]"#),
        GENEROUS,
    )
    .await;

    let outcome = fill(&h.cache, &["a", "b", "c"]).await.unwrap();

    let eviction = outcome.eviction.unwrap();
    assert_eq!(eviction.key, "b");
    assert_eq!(eviction.reason, EvictionReason::Chosen);
}

#[tokio::test]
async fn test_slow_scorer_times_out() {
    let h = harness(
        2,
        Behavior::Slow(Duration::from_millis(500)),
        Duration::from_millis(50),
    )
    .await;
    fill(&h.cache, &["a", "b"]).await;

    let started = Instant::now();
    let outcome = put(&h.cache, "c").await;

    assert!(started.elapsed() < Duration::from_millis(400));
    let eviction = outcome.eviction.unwrap();
    assert_eq!(eviction.key, "a");
    assert_eq!(eviction.reason, EvictionReason::Declined);
}

#[tokio::test]
async fn test_unreachable_scorer_evicts_tail_once() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let stats = Arc::new(KeyStatsStore::new());
    let policy = EvictionPolicy::Scored(ScoredStrategy::new(
        ScoringClient::new("127.0.0.1", port, Duration::from_millis(30)),
        Arc::clone(&stats),
    ));
    let cache = Cache::new(3, policy, stats);

    let mut evicted = Vec::new();
    for key in ["k1", "k2", "k3", "k4"] {
        if let Some(eviction) = put(&cache, key).await.eviction {
            evicted.push(eviction.key);
        }
    }

    assert_eq!(evicted, vec!["k1"]);
    assert_eq!(sorted_keys(&cache).await, vec!["k2", "k3", "k4"]);
}

// == Concurrency ==

#[tokio::test]
async fn test_stale_victim_evicts_tail() {
    let h = harness(3, Behavior::RemoveThenPrefer("b"), GENEROUS).await;

    let outcome = fill(&h.cache, &["a", "b", "c", "d"]).await.unwrap();

    let eviction = outcome.eviction.unwrap();
    assert_eq!(eviction.key, "a");
    assert_eq!(eviction.reason, EvictionReason::StaleVictim);
    assert_eq!(outcome.size, 2);
    assert_eq!(sorted_keys(&h.cache).await, vec!["c", "d"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reads_proceed_during_scoring() {
    let h = harness(
        2,
        Behavior::Slow(Duration::from_millis(300)),
        Duration::from_secs(1),
    )
    .await;
    fill(&h.cache, &["a", "b"]).await;

    let cache = Arc::clone(&h.cache);
    let writer = tokio::spawn(async move { put(&cache, "c").await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let started = Instant::now();
    assert_eq!(h.cache.get("b").await, Some(b"value".to_vec()));
    let overwrite = put(&h.cache, "b").await;
    assert!(started.elapsed() < Duration::from_millis(200));
    assert!(overwrite.eviction.is_none());

    let outcome = writer.await.unwrap();
    assert!(outcome.eviction.is_some());
    assert_eq!(h.cache.size().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_puts_overshoot_by_at_most_one() {
    let capacity = 2;
    let h = harness(
        capacity,
        Behavior::Slow(Duration::from_millis(200)),
        Duration::from_secs(1),
    )
    .await;

    let writers: Vec<_> = (0..6)
        .map(|i| {
            let cache = Arc::clone(&h.cache);
            tokio::spawn(async move { put(&cache, &format!("k{}", i)).await })
        })
        .collect();

    let mut max_observed = 0;
    while !writers.iter().all(|w| w.is_finished()) {
        max_observed = max_observed.max(h.cache.size().await);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let mut returned = Vec::new();
    for writer in writers {
        returned.push(writer.await.unwrap().size);
    }

    assert!(
        max_observed <= capacity + 1,
        "observed {} resident keys with capacity {}",
        max_observed,
        capacity
    );
    assert!(returned.iter().all(|&size| size <= capacity), "{:?}", returned);
    assert_eq!(h.cache.size().await, capacity);
    assert_eq!(h.requests.lock().unwrap().len(), 4);
}
