// src/bin/sync_once.rs
// Run a single sync cycle against the configured store and print the report.
use std::sync::Arc;

use anyhow::Context;
use job_board_sync::{build_orchestrator, init_tracing, SyncConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Arc::new(SyncConfig::load_default().context("loading sync config")?);
    let orchestrator = build_orchestrator(cfg)?;

    let report = orchestrator.run_cycle().await.context("sync cycle failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
