use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use genmix::{router, AppState};
use genmix_core::source::{DataSource, FetchOutcome, FetchRequest, SourceError, UpstreamPayload};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Answers every fetch the same way and remembers the last request.
struct RecordingSource {
    outcome: FetchOutcome,
    last_request: Mutex<Option<FetchRequest>>,
}

impl RecordingSource {
    fn new(outcome: FetchOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            last_request: Mutex::new(None),
        })
    }
}

#[async_trait]
impl DataSource for RecordingSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, SourceError> {
        *self.last_request.lock().await = Some(request.clone());
        Ok(self.outcome.clone())
    }
}

fn payload() -> UpstreamPayload {
    let mut data = Vec::new();
    for hour in 0..6u32 {
        let date_id = format!("2022-11-15 {hour:02}:00:00");
        data.push(json!([date_id, "FR", "Nuclear", f64::from((hour + 1) * 10_000)]));
        data.push(json!([date_id, "FR", "Oil", 500.0]));
    }
    UpstreamPayload {
        columns: vec![
            "date_id".into(),
            "region".into(),
            "generation".into(),
            "value".into(),
        ],
        data: data
            .into_iter()
            .map(|row| row.as_array().cloned().unwrap_or_default())
            .collect(),
    }
}

fn static_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("genmix-{name}-{}", std::process::id()));
    fs::create_dir_all(dir.join("assets")).expect("create static dir");
    fs::write(dir.join("index.html"), "<html>genmix</html>").expect("write index");
    fs::write(dir.join("assets/app.js"), "console.log('genmix');").expect("write script");
    dir
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("router responds");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec();
    (status, content_type, body)
}

#[tokio::test]
async fn data_endpoint_returns_both_passes() {
    let source = RecordingSource::new(FetchOutcome::Payload(payload()));
    let app = router(Arc::new(AppState::new(source.clone(), static_dir("data"))));

    let (status, _, body) = get(app, "/data?from=2022-11-01&to=2022-11-30").await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["type"]["daily"][0]["region"], "FR");
    assert_eq!(body["type"]["daily"][0]["Nuclear"], 210.0);
    assert_eq!(body["type"]["daily"][0]["Oil"], 3.0);
    assert_eq!(body["categorized"]["daily"][0]["renewable"], 210.0);
    assert_eq!(body["categorized"]["daily"][0]["non-renewable"], 3.0);
    assert!(body["type"]["perc_daily"].is_array());
    assert!(body["type"]["monthly"].is_array());

    let request = source.last_request.lock().await.clone().expect("fetched");
    assert_eq!(request.from.to_string(), "2022-11-01");
    assert_eq!(request.to.to_string(), "2022-11-30");
    assert_eq!(request.dataset, "task_generation_h");
}

#[tokio::test]
async fn missing_bounds_use_default_window() {
    let source = RecordingSource::new(FetchOutcome::Payload(payload()));
    let app = router(Arc::new(AppState::new(source.clone(), static_dir("defaults"))));

    let (status, _, _) = get(app, "/data?from=").await;

    assert_eq!(status, StatusCode::OK);
    let request = source.last_request.lock().await.clone().expect("fetched");
    assert_eq!(request, FetchRequest::default());
}

#[tokio::test]
async fn upstream_failure_degrades_to_empty_data() {
    let source = RecordingSource::new(FetchOutcome::Unavailable { status: 503 });
    let app = router(Arc::new(AppState::new(source, static_dir("unavailable"))));

    let (status, _, body) = get(app, "/data").await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "data": [] }));
}

#[tokio::test]
async fn invalid_date_is_a_bad_request() {
    let source = RecordingSource::new(FetchOutcome::Unavailable { status: 503 });
    let app = router(Arc::new(AppState::new(source.clone(), static_dir("invalid"))));

    let (status, _, _) = get(app, "/data?from=October").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(source.last_request.lock().await.is_none());
}

#[tokio::test]
async fn serves_client_files() {
    let source = RecordingSource::new(FetchOutcome::Unavailable { status: 503 });
    let app = router(Arc::new(AppState::new(source, static_dir("assets"))));

    let (status, content_type, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
    assert_eq!(body, b"<html>genmix</html>");

    let (status, content_type, _) = get(app.clone(), "/assets/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/javascript; charset=utf-8"));

    let (status, _, _) = get(app.clone(), "/assets/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get(app, "/assets/../../etc/passwd").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_allow_cross_origin_clients() {
    let source = RecordingSource::new(FetchOutcome::Unavailable { status: 503 });
    let app = router(Arc::new(AppState::new(source.clone(), static_dir("cors"))));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/data")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let preflight = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/data")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("router responds");
    assert_eq!(preflight.status(), StatusCode::NO_CONTENT);
    let headers = preflight.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "GET, HEAD, OPTIONS"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "content-type"
    );
}
