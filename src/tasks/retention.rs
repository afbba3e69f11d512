//! Key Statistics Retention Task
//!
//! Background task that periodically drops statistics for keys that have not
//! been accessed within the retention window.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::KeyStatsStore;

/// Spawns a background task that prunes idle key statistics.
///
/// The task runs in an infinite loop, sleeping for `interval` between runs
/// and dropping statistics idle longer than `retention`.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let stats = Arc::new(KeyStatsStore::new());
/// let handle = spawn_retention_task(stats.clone(), Duration::from_secs(3600), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_retention_task(
    stats: Arc<KeyStatsStore>,
    retention: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting key statistics retention task: retention={}s, interval={}s",
            retention.as_secs(),
            interval.as_secs()
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let dropped = stats.prune_idle(retention);

            if dropped > 0 {
                info!(
                    "Stats retention: dropped {} idle keys, {} remain",
                    dropped,
                    stats.len()
                );
            } else {
                debug!("Stats retention: no idle keys found");
            }
        }
    })
}
