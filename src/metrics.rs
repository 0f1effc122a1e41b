use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the sync series.
    pub fn init() -> Result<Self, BuildError> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("sync_cycles_total", "Sync cycles started.");
    describe_counter!("sync_cycles_failed_total", "Sync cycles that failed.");
    describe_counter!(
        "sync_documents_committed_total",
        "Documents written by committed batches."
    );
    describe_counter!(
        "sync_postings_fetched_total",
        "Raw postings returned by sources."
    );
    describe_counter!(
        "sync_postings_skipped_total",
        "Postings dropped by the title relevance filter."
    );
    describe_counter!(
        "sync_source_unavailable_total",
        "Source fetches that yielded no postings due to an error."
    );
    describe_histogram!("sync_fetch_ms", "Source fetch time in milliseconds.");
    describe_gauge!(
        "sync_last_success_ts",
        "Unix ts of the last successful sync cycle."
    );
}
