//! Chat topic fan-out over live sockets

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use platform_service::realtime::TopicKind;

use crate::common::{assert_silent, expect_close, fake_name, next_json, send_text, TestApp};

#[tokio::test]
async fn test_message_reaches_every_connection_including_sender() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let name = fake_name();
    app.store.add_profile(alice, &name);
    let chat_id = app.store.seed_chat(&[alice, bob]);

    let mut a = app.connect(TopicKind::Chat, chat_id, alice).await;
    let mut b = app.connect(TopicKind::Chat, chat_id, bob).await;

    send_text(&mut a, "hello").await;

    for ws in [&mut a, &mut b] {
        let frame = next_json(ws).await;
        assert_eq!(frame["text"], "hello");
        assert_eq!(frame["user_id"], alice.to_string());
        assert_eq!(frame["chat_id"], chat_id.to_string());
        assert_eq!(frame["user"]["description"], name.as_str());
    }
    assert_eq!(app.store.messages_in(chat_id).len(), 1);
}

#[tokio::test]
async fn test_messages_arrive_in_send_order() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let chat_id = app.store.seed_chat(&[alice, bob]);

    let mut a = app.connect(TopicKind::Chat, chat_id, alice).await;
    let mut b = app.connect(TopicKind::Chat, chat_id, bob).await;

    for n in 0..5 {
        send_text(&mut a, &json!({ "text": format!("m{n}") }).to_string()).await;
    }

    for n in 0..5 {
        assert_eq!(next_json(&mut b).await["text"], format!("m{n}"));
    }
}

#[tokio::test]
async fn test_call_signal_skips_sender() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let chat_id = app.store.seed_chat(&[alice, bob]);

    let mut a = app.connect(TopicKind::Chat, chat_id, alice).await;
    let mut b = app.connect(TopicKind::Chat, chat_id, bob).await;

    let signal = json!({ "type": "incoming-video-call", "callId": "abc" });
    send_text(&mut a, &signal.to_string()).await;

    assert_eq!(next_json(&mut b).await, signal);
    assert_silent(&mut a, Duration::from_millis(200)).await;
    assert!(app.store.messages_in(chat_id).is_empty());
}

#[tokio::test]
async fn test_rest_message_pushed_to_live_connections() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let chat_id = app.store.seed_chat(&[alice, bob]);

    let mut b = app.connect(TopicKind::Chat, chat_id, bob).await;

    app.server()
        .post(&format!("/api/v1/chats/{chat_id}/messages"))
        .authorization_bearer(app.token(alice))
        .json(&json!({ "text": "from rest" }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    assert_eq!(next_json(&mut b).await["text"], "from rest");
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let app = TestApp::spawn().await;
    let alice = Uuid::new_v4();
    let chat_id = app.store.seed_chat(&[alice]);

    let mut a = app.connect(TopicKind::Chat, chat_id, alice).await;

    send_text(&mut a, "{not json").await;
    send_text(&mut a, r#"{"type":"mystery"}"#).await;
    send_text(&mut a, "still here").await;

    assert_eq!(next_json(&mut a).await["text"], "still here");
    assert_eq!(app.store.messages_in(chat_id).len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_reported_to_sender_only() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let chat_id = app.store.seed_chat(&[alice, bob]);

    let mut a = app.connect(TopicKind::Chat, chat_id, alice).await;
    let mut b = app.connect(TopicKind::Chat, chat_id, bob).await;
    app.store.fail_writes(true);

    send_text(&mut a, "lost").await;

    let error = next_json(&mut a).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "persistence_failed");
    assert_silent(&mut b, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_broadcast_regardless_of_persistence_failure() {
    let app = TestApp::spawn_with(|s| s.websocket.broadcast_on_persist_failure = true).await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let chat_id = app.store.seed_chat(&[alice, bob]);

    let mut a = app.connect(TopicKind::Chat, chat_id, alice).await;
    let mut b = app.connect(TopicKind::Chat, chat_id, bob).await;
    app.store.fail_writes(true);

    send_text(&mut a, "best effort").await;

    assert_eq!(next_json(&mut b).await["text"], "best effort");
    assert!(app.store.messages_in(chat_id).is_empty());
}

#[tokio::test]
async fn test_disconnect_unsubscribes() {
    let app = TestApp::spawn().await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let chat_id = app.store.seed_chat(&[alice, bob]);

    let mut a = app.connect(TopicKind::Chat, chat_id, alice).await;
    let b = app.connect(TopicKind::Chat, chat_id, bob).await;

    drop(b);
    app.wait_for_subscribers(TopicKind::Chat, chat_id, 1).await;

    send_text(&mut a, "anyone?").await;
    assert_eq!(next_json(&mut a).await["text"], "anyone?");

    a.close(None).await.unwrap();
    expect_close(&mut a).await;
    app.wait_for_subscribers(TopicKind::Chat, chat_id, 0).await;
    assert!(!app.state.hub.registry(TopicKind::Chat).contains_topic(chat_id));
}
