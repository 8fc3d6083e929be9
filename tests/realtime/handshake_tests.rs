//! Upgrade authentication and authorization

use axum::http::StatusCode;
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest, http::HeaderValue};
use uuid::Uuid;

use platform_service::realtime::TopicKind;

use crate::common::TestApp;

async fn handshake_status(request: impl IntoClientRequest + Unpin) -> StatusCode {
    match tokio_tungstenite::connect_async(request).await {
        Ok(_) => StatusCode::SWITCHING_PROTOCOLS,
        Err(tungstenite::Error::Http(response)) => {
            StatusCode::from_u16(response.status().as_u16()).unwrap()
        }
        Err(other) => panic!("unexpected handshake error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let app = TestApp::spawn().await;
    let chat_id = app.store.seed_chat(&[Uuid::new_v4()]);
    let url = format!("ws://{}/api/v1/chat/{}/ws", app.addr, chat_id);

    assert_eq!(handshake_status(url).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let app = TestApp::spawn().await;
    let chat_id = app.store.seed_chat(&[Uuid::new_v4()]);

    let url = app.ws_url(TopicKind::Chat, chat_id, "garbage");
    assert_eq!(handshake_status(url).await, StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.hub.connection_count(TopicKind::Chat), 0);
}

#[tokio::test]
async fn test_bearer_header_accepted() {
    let app = TestApp::spawn().await;
    let alice = Uuid::new_v4();
    let chat_id = app.store.seed_chat(&[alice]);

    let mut request = format!("ws://{}/api/v1/chat/{}/ws", app.addr, chat_id)
        .into_client_request()
        .unwrap();
    let bearer = format!("Bearer {}", app.token(alice));
    request
        .headers_mut()
        .insert("Authorization", HeaderValue::from_str(&bearer).unwrap());

    assert_eq!(handshake_status(request).await, StatusCode::SWITCHING_PROTOCOLS);
}

#[tokio::test]
async fn test_non_participant_forbidden() {
    let app = TestApp::spawn().await;
    let call_id = app.store.seed_call(&[Uuid::new_v4(), Uuid::new_v4()]);

    let url = app.ws_url(TopicKind::Call, call_id, &app.token(Uuid::new_v4()));
    assert_eq!(handshake_status(url).await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_topic_not_found() {
    let app = TestApp::spawn().await;
    let alice = Uuid::new_v4();

    let url = app.ws_url(TopicKind::Call, Uuid::new_v4(), &app.token(alice));
    assert_eq!(handshake_status(url).await, StatusCode::NOT_FOUND);
}
