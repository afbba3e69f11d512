//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cost_handler, delete_handler, get_handler, health_handler, metrics_handler, put_handler,
    stats_handler, strategy_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /get?key=` - Retrieve a value by key
/// - `PUT /put` - Store a key-value pair
/// - `DELETE /del?key=` - Remove a key
/// - `PUT /strategy` - Switch eviction strategy (`lru` or `ml`)
/// - `PUT /cost` - Set a key's assumed re-fetch cost
/// - `GET /stats` - Metrics as JSON
/// - `GET /metrics` - Metrics in Prometheus text format
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/get", get(get_handler))
        .route("/put", put(put_handler))
        .route("/del", delete(delete_handler))
        .route("/strategy", put(strategy_handler))
        .route("/cost", put(cost_handler))
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
