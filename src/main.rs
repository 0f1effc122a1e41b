//! Job board sync service — binary entrypoint.
//! Boots the Axum HTTP server with the sync trigger, status and metrics routes,
//! and the optional periodic scheduler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use job_board_sync::{
    api::{self, AppState},
    build_orchestrator, init_tracing,
    metrics::Metrics,
    scheduler::spawn_sync_scheduler,
    SyncConfig,
};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Arc::new(SyncConfig::load_default().context("loading sync config")?);
    let orchestrator = build_orchestrator(Arc::clone(&cfg))?;

    let metrics = Metrics::init().context("installing prometheus recorder")?;

    if cfg.sync_interval_secs > 0 {
        spawn_sync_scheduler(
            Arc::clone(&orchestrator),
            Duration::from_secs(cfg.sync_interval_secs),
        );
    }

    let state = AppState::new(orchestrator, &cfg.api_key);
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
