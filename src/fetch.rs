// src/fetch.rs
//! One request per source per cycle. Failures stay inside this module: the
//! caller only ever sees postings or "unavailable".

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;

use crate::config::{SourceConfig, SyncConfig};
use crate::model::{JobsResponse, RawPosting};

const USER_AGENT: &str = concat!("job-board-sync/", env!("CARGO_PKG_VERSION"));

/// Source-level result. Never escalates to a cycle failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Postings(Vec<RawPosting>),
    Unavailable { reason: String },
}

impl FetchOutcome {
    pub fn postings(self) -> Vec<RawPosting> {
        match self {
            FetchOutcome::Postings(p) => p,
            FetchOutcome::Unavailable { .. } => Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FetchOutcome::Postings(_))
    }
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceConfig) -> FetchOutcome;
}

/// Greenhouse board API over HTTP.
pub struct GreenhouseFetcher {
    client: Client,
    endpoint_template: String,
}

impl GreenhouseFetcher {
    pub fn new(endpoint_template: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            endpoint_template: endpoint_template.into(),
        })
    }

    pub fn from_config(cfg: &SyncConfig) -> anyhow::Result<Self> {
        Self::new(
            cfg.endpoint_template.clone(),
            Duration::from_secs(cfg.request_timeout_secs),
        )
    }

    async fn get_jobs(&self, url: &str) -> anyhow::Result<Vec<RawPosting>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("jobs http get()")?
            .error_for_status()
            .context("jobs non-2xx")?;
        let body: JobsResponse = resp.json().await.context("decoding jobs json")?;
        Ok(body.jobs)
    }
}

#[async_trait]
impl SourceFetcher for GreenhouseFetcher {
    async fn fetch(&self, source: &SourceConfig) -> FetchOutcome {
        let url = source.endpoint_url(&self.endpoint_template);
        let t0 = Instant::now();
        let res = self.get_jobs(&url).await;
        histogram!("sync_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(jobs) => {
                tracing::debug!(target: "fetch", source = %source.slug, count = jobs.len(), "fetched");
                counter!("sync_postings_fetched_total").increment(jobs.len() as u64);
                FetchOutcome::Postings(jobs)
            }
            Err(e) => {
                tracing::warn!(target: "fetch", source = %source.slug, error = ?e, "source unavailable");
                counter!("sync_source_unavailable_total").increment(1);
                FetchOutcome::Unavailable {
                    reason: format!("{e:#}"),
                }
            }
        }
    }
}
