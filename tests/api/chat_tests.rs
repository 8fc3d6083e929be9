//! Chat REST API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::TestApp;

#[tokio::test]
async fn test_requests_without_token_rejected() {
    let app = TestApp::spawn().await;

    let response = app.server().get("/api/v1/chats").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .server()
        .get("/api/v1/chats")
        .authorization_bearer("not-a-jwt")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_chat_adds_caller_first() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    app.store.add_profile(alice, "Alice");

    let response = app
        .server()
        .post("/api/v1/chats")
        .authorization_bearer(app.token(alice))
        .json(&json!({ "users": [bob, alice] }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let users: Vec<&str> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec![alice.to_string(), bob.to_string()]);
    assert_eq!(body["users"][0]["description"], "Alice");
}

#[tokio::test]
async fn test_list_chats_includes_last_message() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let chat_id = app.store.seed_chat(&[alice, bob]);
    let server = app.server();

    server
        .post(&format!("/api/v1/chats/{chat_id}/messages"))
        .authorization_bearer(app.token(bob))
        .json(&json!({ "text": "latest" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get("/api/v1/chats")
        .authorization_bearer(app.token(alice))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["last_message"]["text"], "latest");
}

#[tokio::test]
async fn test_messages_newest_first_with_paging() {
    let app = TestApp::spawn().await;
    let alice = Uuid::new_v4();
    let chat_id = app.store.seed_chat(&[alice]);
    let server = app.server();

    for text in ["one", "two", "three"] {
        server
            .post(&format!("/api/v1/chats/{chat_id}/messages"))
            .authorization_bearer(app.token(alice))
            .json(&json!({ "text": text }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .get(&format!("/api/v1/chats/{chat_id}/messages"))
        .add_query_param("limit", 2)
        .add_query_param("offset", 1)
        .authorization_bearer(app.token(alice))
        .await;

    response.assert_status_ok();
    let texts: Vec<String> = response
        .json::<Vec<Value>>()
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(texts, vec!["two".to_owned(), "one".to_owned()]);
}

#[tokio::test]
async fn test_non_participant_forbidden() {
    let app = TestApp::spawn().await;
    let chat_id = app.store.seed_chat(&[Uuid::new_v4()]);

    let response = app
        .server()
        .get(&format!("/api/v1/chats/{chat_id}/messages"))
        .authorization_bearer(app.token(Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_chat_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .server()
        .get(&format!("/api/v1/chats/{}/messages", Uuid::new_v4()))
        .authorization_bearer(app.token(Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_and_blank_messages_rejected() {
    let app = TestApp::spawn().await;
    let alice = Uuid::new_v4();
    let chat_id = app.store.seed_chat(&[alice]);
    let server = app.server();

    for text in ["", "   ", "\n\t"] {
        let response = server
            .post(&format!("/api/v1/chats/{chat_id}/messages"))
            .authorization_bearer(app.token(alice))
            .json(&json!({ "text": text }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
    assert!(app.store.messages_in(chat_id).is_empty());
}
