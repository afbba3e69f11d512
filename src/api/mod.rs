//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /get?key=` - Retrieve a value by key
//! - `PUT /put` - Store a key-value pair
//! - `DELETE /del?key=` - Remove a key
//! - `PUT /strategy` - Switch eviction strategy
//! - `PUT /cost` - Set a key's re-fetch cost
//! - `GET /stats` - Metrics as JSON
//! - `GET /metrics` - Prometheus metrics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
