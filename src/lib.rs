// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod keywords;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod sanitize;
pub mod scheduler;
pub mod store;
pub mod sync;
pub mod tags;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::{SourceConfig, SyncConfig};
pub use crate::error::{NormalizeError, StoreError, SyncError};
pub use crate::fetch::{FetchOutcome, GreenhouseFetcher, SourceFetcher};
pub use crate::model::{CanonicalJobDocument, RawPosting};
pub use crate::store::{DocumentStore, JsonFileStore, MemoryStore, WriteBatch};
pub use crate::sync::{SyncOrchestrator, SyncReport, SyncState};

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the fmt subscriber. `RUST_LOG` wins over the default filter;
/// `JOB_SYNC_LOG_JSON=1` switches to JSON lines. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("job_board_sync=info,sync=info,fetch=info,api=info,warn"));
    let json = std::env::var("JOB_SYNC_LOG_JSON").ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Wire the Greenhouse fetcher and the JSON file store behind an orchestrator.
pub fn build_orchestrator(cfg: Arc<SyncConfig>) -> anyhow::Result<Arc<SyncOrchestrator>> {
    let fetcher = Arc::new(GreenhouseFetcher::from_config(&cfg)?);
    let store = Arc::new(JsonFileStore::new(cfg.store_path.clone()));
    tracing::info!(
        sources = cfg.sources.len(),
        keywords = cfg.keywords.len(),
        store = %cfg.store_path.display(),
        "sync configured"
    );
    Ok(Arc::new(SyncOrchestrator::new(cfg, fetcher, store)?))
}
