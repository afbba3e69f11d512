//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::access_log::{AccessLog, AccessLogError, AccessRecord};
use crate::cache::{Cache, KeyStatsStore};
use crate::config::{Config, StrategyKind};
use crate::error::{CacheError, Result};
use crate::eviction::{EvictionPolicy, ScoredStrategy, ScoringClient};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::models::{
    FetchCostRequest, GetResponse, HealthResponse, KeyAckResponse, KeyQuery, PutRequest,
    PutResponse, StrategyRequest, StrategyResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache service
    pub cache: Arc<Cache>,
    pub metrics: Arc<Metrics>,
    /// CSV access log, when enabled
    pub access_log: Option<Arc<AccessLog>>,
    /// Sidecar client used whenever the scored strategy is (re)selected
    scoring_client: ScoringClient,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: Cache, scoring_client: ScoringClient) -> Self {
        Self {
            cache: Arc::new(cache),
            metrics: Arc::new(Metrics::new()),
            access_log: None,
            scoring_client,
        }
    }

    pub fn with_access_log(mut self, access_log: AccessLog) -> Self {
        self.access_log = Some(Arc::new(access_log));
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the key statistics store, the startup strategy and the cache,
    /// and opens the access log when a path is configured.
    pub fn from_config(config: &Config) -> std::result::Result<Self, AccessLogError> {
        let stats = Arc::new(KeyStatsStore::new());
        let scoring_client = ScoringClient::new(
            &config.scorer_host,
            config.scorer_port,
            config.scorer_timeout(),
        );
        let policy = build_policy(config.strategy, &scoring_client, &stats);
        let cache = Cache::new(config.capacity, policy, stats)
            .with_candidate_window(config.candidate_window);

        let state = Self::new(cache, scoring_client);
        match &config.access_log_path {
            Some(path) => Ok(state.with_access_log(AccessLog::open(path)?)),
            None => Ok(state),
        }
    }

    /// Builds a fresh policy of the given kind sharing this cache's statistics.
    pub fn policy_for(&self, kind: StrategyKind) -> EvictionPolicy {
        build_policy(kind, &self.scoring_client, self.cache.key_stats())
    }

    fn log_access(&self, record: AccessRecord<'_>) {
        if let Some(log) = &self.access_log {
            log.record(record);
        }
    }
}

fn build_policy(
    kind: StrategyKind,
    client: &ScoringClient,
    stats: &Arc<KeyStatsStore>,
) -> EvictionPolicy {
    match kind {
        StrategyKind::Lru => EvictionPolicy::recency(),
        StrategyKind::Ml => {
            EvictionPolicy::Scored(ScoredStrategy::new(client.clone(), Arc::clone(stats)))
        }
    }
}

/// Handler for GET /get?key=
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponse>> {
    let key = query.into_key().map_err(CacheError::InvalidRequest)?;

    let started = Instant::now();
    let value = state.cache.get(&key).await;
    let latency_us = started.elapsed().as_micros() as u64;

    let hit = value.is_some();
    state.metrics.record_get(hit, latency_us);
    state.log_access(AccessRecord {
        op: "get",
        key: &key,
        hit,
        latency_us,
        size_bytes: value.as_ref().map_or(0, Vec::len),
    });

    match value {
        Some(value) => Ok(Json(GetResponse::new(key, &value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for PUT /put
///
/// Stores a key-value pair, evicting one entry if the cache overflows.
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let size_bytes = req.value.len();
    let started = Instant::now();
    let outcome = state.cache.put(req.key.clone(), req.value.into_bytes()).await;
    let latency_us = started.elapsed().as_micros() as u64;

    state.metrics.record_put();
    state.metrics.set_current_size(outcome.size);
    if let Some(eviction) = &outcome.eviction {
        state.metrics.record_eviction(eviction.reason.is_fallback());
    }
    state.log_access(AccessRecord {
        op: "put",
        key: &req.key,
        hit: false,
        latency_us,
        size_bytes,
    });

    Ok(Json(PutResponse::new(
        outcome.size,
        outcome.eviction.map(|e| e.key),
    )))
}

/// Handler for DELETE /del?key=
///
/// Removes a key from the cache. Its statistics are kept.
pub async fn delete_handler(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<KeyAckResponse>> {
    let key = query.into_key().map_err(CacheError::InvalidRequest)?;

    if !state.cache.remove(&key).await {
        return Err(CacheError::NotFound(key));
    }
    state.metrics.set_current_size(state.cache.size().await);

    Ok(Json(KeyAckResponse::new(key)))
}

/// Handler for PUT /strategy
///
/// Swaps the active eviction strategy for subsequent evictions.
pub async fn strategy_handler(
    State(state): State<AppState>,
    Json(req): Json<StrategyRequest>,
) -> Result<Json<StrategyResponse>> {
    let kind: StrategyKind = req.strategy.parse().map_err(CacheError::InvalidRequest)?;

    state.cache.set_strategy(state.policy_for(kind));

    Ok(Json(StrategyResponse::new(state.cache.strategy_name())))
}

/// Handler for PUT /cost
///
/// Records the assumed re-fetch cost of a key for future scoring.
pub async fn cost_handler(
    State(state): State<AppState>,
    Json(req): Json<FetchCostRequest>,
) -> Result<Json<KeyAckResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .cache
        .key_stats()
        .set_fetch_cost_ms(&req.key, req.fetch_cost_ms);

    Ok(Json(KeyAckResponse::new(req.key)))
}

/// Handler for GET /stats
///
/// Returns the metrics snapshot as JSON.
pub async fn stats_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    state.metrics.set_current_size(state.cache.size().await);
    Json(state.metrics.snapshot())
}

/// Handler for GET /metrics
///
/// Returns the metrics in Prometheus text format.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.set_current_size(state.cache.size().await);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
