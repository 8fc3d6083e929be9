//! Call REST API Tests

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::TestApp;

#[tokio::test]
async fn test_create_call_appends_caller() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let response = app
        .server()
        .post("/api/v1/calls")
        .authorization_bearer(app.token(alice))
        .json(&json!({ "participants": [bob] }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "active");
    assert_eq!(body["participants"][0]["id"], bob.to_string());
    assert_eq!(body["participants"][1]["id"], alice.to_string());
}

#[tokio::test]
async fn test_call_with_only_the_caller_rejected() {
    let app = TestApp::spawn().await;
    let alice = Uuid::new_v4();

    let response = app
        .server()
        .post("/api/v1/calls")
        .authorization_bearer(app.token(alice))
        .json(&json!({ "participants": [alice] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_participants_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .server()
        .post("/api/v1/calls")
        .authorization_bearer(app.token(Uuid::new_v4()))
        .json(&json!({ "participants": [] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_lists_only_own_calls() {
    let app = TestApp::spawn().await;
    let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let mine = app.store.seed_call(&[alice, bob]);
    app.store.seed_call(&[bob, carol]);

    let response = app
        .server()
        .get("/api/v1/calls/history")
        .authorization_bearer(app.token(alice))
        .await;

    response.assert_status_ok();
    let body: Vec<Value> = response.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["call"]["id"], mine.to_string());
    assert_eq!(body[0]["transcript"], json!([]));
}
