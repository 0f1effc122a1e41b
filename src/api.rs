// src/api.rs
//! HTTP trigger surface: health, the key-gated sync trigger, and status.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::sync::{SyncOrchestrator, SyncState};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<SyncOrchestrator>,
    api_key_digest: [u8; 32],
}

impl AppState {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, api_key: &str) -> Self {
        Self {
            orchestrator,
            api_key_digest: digest(api_key),
        }
    }

    /// Keys are compared by digest so the comparison does not depend on key length.
    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|k| digest(k) == self.api_key_digest)
    }
}

fn digest(s: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(s.as_bytes()));
    out
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid or missing API Key")]
    Forbidden,
    #[error("{0}")]
    SyncFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::SyncFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub status: &'static str,
    pub message: String,
    pub synced_count: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/sync-jobs", get(sync_jobs))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "API is running. Access /sync-jobs with your API key to update the job store."
    }))
}

async fn sync_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SyncResponse>, ApiError> {
    if !state.authorized(&headers) {
        tracing::warn!(target: "api", "sync trigger rejected: bad api key");
        return Err(ApiError::Forbidden);
    }

    // Detached so a client hanging up does not cancel a cycle halfway.
    let orchestrator = Arc::clone(&state.orchestrator);
    let report = tokio::spawn(async move { orchestrator.run_cycle().await })
        .await
        .map_err(|e| ApiError::SyncFailed(format!("sync task failed: {e}")))?
        .map_err(|e| ApiError::SyncFailed(e.to_string()))?;

    Ok(Json(SyncResponse {
        status: "success",
        message: format!(
            "Successfully synced {} jobs to collection `{}` in one batch",
            report.synced_count,
            state.orchestrator.config().collection
        ),
        synced_count: report.synced_count,
    }))
}

async fn status(State(state): State<AppState>) -> Json<SyncState> {
    Json(state.orchestrator.state())
}
