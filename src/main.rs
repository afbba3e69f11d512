//! Scored Cache - An in-memory cache server with pluggable eviction
//!
//! Serves the cache over HTTP and consults the scoring sidecar on eviction
//! when the `ml` strategy is active.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scored_cache::api::{create_router, AppState};
use scored_cache::config::Config;
use scored_cache::tasks::spawn_retention_task;

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build key statistics, startup strategy, cache and access log
/// 4. Start background statistics retention task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scored_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scored Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}, strategy={}, scorer={}:{} ({}ms), window={}, port={}",
        config.capacity,
        config.strategy.as_str(),
        config.scorer_host,
        config.scorer_port,
        config.scorer_timeout_ms,
        config.candidate_window,
        config.server_port
    );

    let state = AppState::from_config(&config).context("failed to initialise cache state")?;
    match &state.access_log {
        Some(log) => info!("Access log enabled at {}", log.path().display()),
        None => info!("Access log disabled"),
    }
    info!("Cache initialized with '{}' eviction", state.cache.strategy_name());

    let retention_handle = if config.stats_retention_secs > 0 {
        info!("Key statistics retention task started");
        Some(spawn_retention_task(
            state.cache.key_stats().clone(),
            Duration::from_secs(config.stats_retention_secs),
            Duration::from_secs(config.stats_prune_interval_secs.max(1)),
        ))
    } else {
        info!("Key statistics retention disabled");
        None
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(retention_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the retention task and allows graceful shutdown.
async fn shutdown_signal(retention_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = retention_handle {
        handle.abort();
        warn!("Retention task aborted");
    }
}
