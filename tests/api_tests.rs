//! End-to-end tests for the HTTP API, driven through the router with `oneshot`.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use eda_services::{build_app, config::Config, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Helper Functions
// ============================================================================

const BOUNDARY: &str = "eda-test-boundary";

fn app() -> Router {
    build_app(Arc::new(AppState::new(Config::default())))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn json_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/quality")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn upload_request(file_name: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = file_name,
        c = content
    );
    Request::builder()
        .method("POST")
        .uri("/quality-from-csv")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "EDA API is running"}));
}

// ============================================================================
// POST /quality
// ============================================================================

#[tokio::test]
async fn quality_from_columns_returns_flags() {
    let payload = json!({
        "columns": {
            "age": [10, 20, 30, null],
            "height": [140, 150, 160, 170],
            "city": ["A", "B", "A", null]
        }
    });
    let (status, body) = send(json_request(payload.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let score = body["quality_score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
    assert_eq!(body["too_few_rows"], true);
    assert_eq!(body["max_missing_share"], 0.25);
    assert!(body.get("has_numeric_columns_with_low_variation").is_some());
}

#[tokio::test]
async fn quality_rejects_empty_dataset() {
    let (status, body) = send(json_request(json!({"columns": {"a": []}}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Empty dataset"));

    let (status, _) = send(json_request(json!({"columns": {}}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quality_rejects_malformed_payloads() {
    let (status, _) = send(json_request("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(json_request(json!({"rows": [1, 2]}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(json_request(json!({"columns": {"a": [1, 2], "b": [1]}}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("expected 2"));
}

// ============================================================================
// POST /quality-from-csv
// ============================================================================

#[tokio::test]
async fn quality_from_csv_returns_flags() {
    let (status, body) = send(upload_request("data.csv", "x,y\n1,a\n2,b\n3,a\n")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["too_few_rows"], true);
    assert_eq!(body["too_many_missing"], false);
    assert_eq!(body["max_missing_share"], 0.0);
}

#[tokio::test]
async fn quality_from_csv_accepts_txt() {
    let (status, _) = send(upload_request("data.txt", "x\n1\n2\n")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn quality_from_csv_extension_is_case_sensitive() {
    let (status, body) = send(upload_request("data.CSV", "x\n1\n2\n")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input: Only CSV files are allowed");
}

#[tokio::test]
async fn quality_from_csv_counts_na_markers_as_missing() {
    let (status, body) = send(upload_request("data.csv", "x,y\n1,a\nNA,b\nNA,c\n4,NULL\n")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_missing_share"], 0.5);
    assert_eq!(body["too_many_missing"], false);
}

#[tokio::test]
async fn quality_from_csv_rejects_wrong_extension() {
    let (status, body) = send(upload_request("data.xlsx", "x\n1\n")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input: Only CSV files are allowed");
}

#[tokio::test]
async fn quality_from_csv_rejects_empty_dataset() {
    let (status, _) = send(upload_request("empty.csv", "a,b\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quality_from_csv_requires_file_field() {
    let body = format!("--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{b}--\r\n", b = BOUNDARY);
    let request = Request::builder()
        .method("POST")
        .uri("/quality-from-csv")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No file provided"));
}
