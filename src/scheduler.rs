// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::sync::SyncOrchestrator;

/// Spawn a ticker that runs one sync cycle every `interval`. The first tick
/// fires immediately. Failed cycles are logged and the loop keeps going.
pub fn spawn_sync_scheduler(orchestrator: Arc<SyncOrchestrator>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match orchestrator.run_cycle().await {
                Ok(report) => tracing::info!(
                    target: "sync",
                    synced = report.synced_count,
                    "scheduled sync tick"
                ),
                Err(e) => tracing::warn!(target: "sync", error = %e, "scheduled sync tick failed"),
            }
        }
    })
}
