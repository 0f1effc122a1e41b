// tests/common/mod.rs
// Shared doubles for the sync integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use job_board_sync::model::{PostingId, PostingLocation};
use job_board_sync::{
    DocumentStore, FetchOutcome, MemoryStore, RawPosting, SourceConfig, SourceFetcher, StoreError,
    SyncConfig, SyncOrchestrator, WriteBatch,
};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap()
}

pub fn posting(id: u64, title: &str) -> RawPosting {
    RawPosting {
        id: Some(PostingId::Number(id)),
        title: Some(title.to_string()),
        location: Some(PostingLocation {
            name: Some("Remote - US".into()),
        }),
        absolute_url: Some(format!("https://boards.greenhouse.io/x/jobs/{id}")),
        content: Some("&lt;p&gt;Work with Python and React.&lt;/p&gt;".into()),
        updated_at: Some("2025-05-30T12:00:00-04:00".into()),
    }
}

/// Config with the seed vocabulary and the given source slugs.
pub fn config_for(slugs: &[&str]) -> SyncConfig {
    let mut cfg = SyncConfig::default_seed();
    cfg.sources = slugs.iter().map(|s| SourceConfig::new(*s)).collect();
    cfg
}

/// Canned outcome per slug; unknown slugs are unavailable. Records calls.
#[derive(Default)]
pub struct StubFetcher {
    outcomes: HashMap<String, FetchOutcome>,
    pub calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slug: &str, outcome: FetchOutcome) -> Self {
        self.outcomes.insert(slug.to_string(), outcome);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    async fn fetch(&self, source: &SourceConfig) -> FetchOutcome {
        self.calls.lock().unwrap().push(source.slug.clone());
        self.outcomes
            .get(&source.slug)
            .cloned()
            .unwrap_or(FetchOutcome::Unavailable {
                reason: "HTTP 404 Not Found".into(),
            })
    }
}

/// Answers like the wrapped stub, but only after `delay`.
pub struct DelayedFetcher {
    pub inner: StubFetcher,
    pub delay: std::time::Duration,
}

#[async_trait]
impl SourceFetcher for DelayedFetcher {
    async fn fetch(&self, source: &SourceConfig) -> FetchOutcome {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch(source).await
    }
}

/// MemoryStore that records batch sizes and can be told to reject commits.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub commits: Mutex<Vec<usize>>,
    /// Key count of every `get_many` call.
    pub lookups: Mutex<Vec<usize>>,
    pub fail_commits: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let s = Self::default();
        s.fail_commits.store(true, Ordering::SeqCst);
        s
    }

    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commits.lock().unwrap().clone()
    }

    pub fn lookup_sizes(&self) -> Vec<usize> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }
        self.commits.lock().unwrap().push(batch.len());
        self.inner.commit(batch).await
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, key).await
    }

    async fn get_many(
        &self,
        collection: &str,
        keys: &[String],
    ) -> Result<HashMap<String, Value>, StoreError> {
        self.lookups.lock().unwrap().push(keys.len());
        self.inner.get_many(collection, keys).await
    }
}

pub fn orchestrator(
    cfg: SyncConfig,
    fetcher: Arc<dyn SourceFetcher>,
    store: Arc<RecordingStore>,
) -> SyncOrchestrator {
    SyncOrchestrator::new(Arc::new(cfg), fetcher, store).expect("valid config")
}
