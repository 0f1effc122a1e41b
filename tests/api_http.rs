// tests/api_http.rs
//
// HTTP-level tests for the trigger router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

mod common;

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use common::{config_for, posting, DelayedFetcher, RecordingStore, StubFetcher};
use job_board_sync::api::{self, AppState, API_KEY_HEADER};
use job_board_sync::{FetchOutcome, SourceFetcher, SyncOrchestrator};

const BODY_LIMIT: usize = 1024 * 1024;
const KEY: &str = "test-key-123";

fn app(fetcher: Arc<dyn SourceFetcher>, store: Arc<RecordingStore>) -> Router {
    let orch = SyncOrchestrator::new(Arc::new(config_for(&["figma", "discord"])), fetcher, store)
        .expect("valid config");
    api::router(AppState::new(Arc::new(orch), KEY))
}

fn healthy_fetcher() -> Arc<StubFetcher> {
    Arc::new(StubFetcher::new().with(
        "figma",
        FetchOutcome::Postings(vec![
            posting(1, "Frontend Developer"),
            posting(2, "Head of Catering"),
            posting(3, "Analytics Engineer"),
        ]),
    ))
}

async fn get(app: Router, uri: &str, key: Option<&str>) -> (StatusCode, Json) {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(k) = key {
        req = req.header(API_KEY_HEADER, k);
    }
    let resp = app
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn health_is_open() {
    let (status, body) = get(app(healthy_fetcher(), Arc::new(RecordingStore::new())), "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["status"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn missing_or_wrong_key_is_forbidden_before_any_fetch() {
    let fetcher = healthy_fetcher();
    let store = Arc::new(RecordingStore::new());

    let (status, body) = get(app(fetcher.clone(), store.clone()), "/sync-jobs", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Invalid or missing API Key");

    let (status, _) = get(app(fetcher.clone(), store.clone()), "/sync-jobs", Some("nope")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(fetcher.call_count(), 0);
    assert!(store.commit_sizes().is_empty());
}

#[tokio::test]
async fn valid_key_runs_a_cycle() {
    let store = Arc::new(RecordingStore::new());
    let (status, body) = get(app(healthy_fetcher(), store.clone()), "/sync-jobs", Some(KEY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["syncedCount"], 2);
    assert!(body["message"].as_str().unwrap().contains('2'));
    assert_eq!(store.commit_sizes(), vec![2]);
}

#[tokio::test]
async fn failed_cycle_is_500_with_cause() {
    let store = Arc::new(RecordingStore::failing());
    let (status, body) = get(app(healthy_fetcher(), store), "/sync-jobs", Some(KEY)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("injected commit failure"));
}

#[tokio::test]
async fn status_reports_last_cycle() {
    let store = Arc::new(RecordingStore::new());
    let router = app(healthy_fetcher(), store);

    let (_, idle) = get(router.clone(), "/status", None).await;
    assert_eq!(idle["state"], "idle");

    let _ = get(router.clone(), "/sync-jobs", Some(KEY)).await;
    let (status, body) = get(router, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "succeeded");
    assert_eq!(body["report"]["synced_count"], 2);
    assert_eq!(body["report"]["sources"][1]["available"], false);
}

#[tokio::test]
async fn client_hanging_up_does_not_cancel_the_cycle() {
    let store = Arc::new(RecordingStore::new());
    let slow = Arc::new(DelayedFetcher {
        inner: StubFetcher::new().with(
            "figma",
            FetchOutcome::Postings(vec![posting(1, "Frontend Developer")]),
        ),
        delay: std::time::Duration::from_millis(100),
    });
    let router = app(slow, store.clone());

    let req = Request::builder()
        .uri("/sync-jobs")
        .header(API_KEY_HEADER, KEY)
        .body(Body::empty())
        .unwrap();
    let gave_up =
        tokio::time::timeout(std::time::Duration::from_millis(10), router.clone().oneshot(req)).await;
    assert!(gave_up.is_err());

    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    let (_, body) = get(router, "/status", None).await;
    assert_eq!(body["state"], "succeeded");
    assert_eq!(store.commit_sizes(), vec![1]);
}
