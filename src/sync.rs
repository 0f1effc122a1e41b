// src/sync.rs
//! Sync cycle: fetch every source, filter + normalize each posting, commit
//! the staged documents as one atomic batch.
//!
//! Two failure boundaries: a source that cannot be fetched contributes zero
//! postings and the cycle goes on; anything else (normalization, store
//! read/commit) fails the whole cycle and nothing staged is persisted.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::config::{CreatedAtPolicy, SourceConfig, SyncConfig};
use crate::error::{ConfigError, NormalizeError, SyncError};
use crate::fetch::{FetchOutcome, SourceFetcher};
use crate::model::CanonicalJobDocument;
use crate::normalize::RecordNormalizer;
use crate::store::DocumentStore;

/// Per-source tally of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub available: bool,
    pub fetched: usize,
    pub staged: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    /// Documents staged and committed this cycle.
    pub synced_count: usize,
    pub sources: Vec<SourceReport>,
}

impl SyncReport {
    pub fn unavailable_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|s| !s.available)
            .map(|s| s.source.as_str())
            .collect()
    }
}

/// Orchestrator lifecycle: `Idle -> Running -> {Succeeded, Failed}`. A new
/// trigger moves a finished orchestrator back to `Running`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Running {
        started_at: DateTime<Utc>,
    },
    Succeeded {
        report: SyncReport,
    },
    Failed {
        started_at: DateTime<Utc>,
        cause: String,
    },
}

/// Cause recorded when a cycle future is dropped before it finishes.
pub const CANCELLED_CAUSE: &str = "sync cycle cancelled before completion";

/// Lives across the await in `run_cycle_at`; only runs if the future is dropped.
struct CancelGuard<'a> {
    orchestrator: &'a SyncOrchestrator,
    started_at: DateTime<Utc>,
    armed: bool,
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(target: "sync", "sync cycle cancelled");
        counter!("sync_cycles_failed_total").increment(1);
        self.orchestrator.set_state(SyncState::Failed {
            started_at: self.started_at,
            cause: CANCELLED_CAUSE.to_string(),
        });
    }
}

pub struct SyncOrchestrator {
    config: Arc<SyncConfig>,
    normalizer: RecordNormalizer,
    fetcher: Arc<dyn SourceFetcher>,
    store: Arc<dyn DocumentStore>,
    state: RwLock<SyncState>,
}

impl SyncOrchestrator {
    pub fn new(
        config: Arc<SyncConfig>,
        fetcher: Arc<dyn SourceFetcher>,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, ConfigError> {
        let normalizer = RecordNormalizer::from_config(&config)?;
        Ok(Self {
            config,
            normalizer,
            fetcher,
            store,
            state: RwLock::new(SyncState::Idle),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn state(&self) -> SyncState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_state(&self, next: SyncState) {
        *self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
    }

    /// Run one cycle stamped with the current time.
    pub async fn run_cycle(&self) -> Result<SyncReport, SyncError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle with a fixed `now` for every timestamp it writes.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        self.set_state(SyncState::Running { started_at: now });
        counter!("sync_cycles_total").increment(1);

        let mut guard = CancelGuard {
            orchestrator: self,
            started_at: now,
            armed: true,
        };
        let res = self.execute(now).await;
        guard.armed = false;
        match &res {
            Ok(report) => {
                tracing::info!(
                    target: "sync",
                    synced = report.synced_count,
                    unavailable = ?report.unavailable_sources(),
                    "sync cycle succeeded"
                );
                gauge!("sync_last_success_ts").set(now.timestamp() as f64);
                self.set_state(SyncState::Succeeded {
                    report: report.clone(),
                });
            }
            Err(e) => {
                tracing::error!(target: "sync", error = %e, "sync cycle failed");
                counter!("sync_cycles_failed_total").increment(1);
                self.set_state(SyncState::Failed {
                    started_at: now,
                    cause: e.to_string(),
                });
            }
        }
        res
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        let outcomes = self.fetch_all().await;

        let mut staged: Vec<CanonicalJobDocument> = Vec::new();
        let mut reports = Vec::with_capacity(outcomes.len());
        for (source, outcome) in self.config.sources.iter().zip(outcomes) {
            let mut report = SourceReport {
                source: source.slug.clone(),
                available: outcome.is_available(),
                fetched: 0,
                staged: 0,
                skipped: 0,
                unavailable_reason: None,
            };
            let postings = match outcome {
                FetchOutcome::Postings(p) => p,
                FetchOutcome::Unavailable { reason } => {
                    report.unavailable_reason = Some(reason);
                    reports.push(report);
                    continue;
                }
            };

            report.fetched = postings.len();
            for raw in &postings {
                match self.normalizer.normalize(raw, source, now)? {
                    Some(doc) => {
                        report.staged += 1;
                        staged.push(doc);
                    }
                    None => report.skipped += 1,
                }
            }
            counter!("sync_postings_skipped_total").increment(report.skipped as u64);
            reports.push(report);
        }

        let synced_count = staged.len();
        if staged.is_empty() {
            tracing::info!(target: "sync", "nothing staged, skipping commit");
        } else {
            if self.config.created_at == CreatedAtPolicy::Preserve {
                self.carry_created_at(&mut staged).await?;
            }
            self.commit(&staged).await?;
        }

        Ok(SyncReport {
            started_at: now,
            synced_count,
            sources: reports,
        })
    }

    /// Fetch all sources concurrently; outcomes come back in configured order.
    /// A fetch task that dies counts as an unavailable source.
    async fn fetch_all(&self) -> Vec<FetchOutcome> {
        let sources: &[SourceConfig] = &self.config.sources;
        let mut set = JoinSet::new();
        for (idx, source) in sources.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            set.spawn(async move { (idx, fetcher.fetch(&source).await) });
        }

        let mut outcomes: Vec<Option<FetchOutcome>> = vec![None; sources.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
                Err(e) => {
                    tracing::warn!(target: "sync", error = %e, "fetch task did not complete");
                    counter!("sync_source_unavailable_total").increment(1);
                }
            }
        }

        outcomes
            .into_iter()
            .map(|o| {
                o.unwrap_or_else(|| FetchOutcome::Unavailable {
                    reason: "fetch task did not complete".to_string(),
                })
            })
            .collect()
    }

    /// Keep `createdAt` from an already stored document with the same key.
    async fn carry_created_at(&self, staged: &mut [CanonicalJobDocument]) -> Result<(), SyncError> {
        let keys: Vec<String> = staged.iter().map(|d| d.external_id.clone()).collect();
        let existing = self
            .store
            .get_many(&self.config.collection, &keys)
            .await
            .map_err(SyncError::Lookup)?;
        if existing.is_empty() {
            return Ok(());
        }

        for doc in staged.iter_mut() {
            let first_seen = existing
                .get(&doc.external_id)
                .and_then(|v| v.get("createdAt"))
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc));
            if let Some(created_at) = first_seen {
                doc.created_at = created_at;
            }
        }
        Ok(())
    }

    async fn commit(&self, staged: &[CanonicalJobDocument]) -> Result<(), SyncError> {
        let mut batch = self.store.new_batch(&self.config.collection);
        for doc in staged {
            let value = serde_json::to_value(doc).map_err(|source| NormalizeError::Encode {
                external_id: doc.external_id.clone(),
                source,
            })?;
            batch.set(doc.external_id.clone(), value);
        }

        let n = self.store.commit(batch).await.map_err(SyncError::Commit)?;
        counter!("sync_documents_committed_total").increment(n as u64);
        tracing::debug!(target: "sync", writes = n, collection = %self.config.collection, "batch committed");
        Ok(())
    }
}
