//! Health Check API Tests

use axum::http::StatusCode;
use serde_json::Value;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::spawn().await;

    let response = app.server().get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::spawn().await;

    let response = app.server().get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_connection_counts() {
    let app = TestApp::spawn().await;

    let response = app.server().get("/health/ready").await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["realtime"]["chat_connections"], 0);
    assert_eq!(body["checks"]["realtime"]["call_connections"], 0);
}

#[tokio::test]
async fn test_metrics_exposed() {
    let app = TestApp::spawn().await;
    let server = app.server();
    server.get("/health").await.assert_status_ok();

    let response = server.get("/metrics").await;

    response.assert_status_ok();
    assert!(response.text().contains("platform_service_http_requests_total"));
}
