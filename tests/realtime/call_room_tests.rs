//! Call topic signalling over live sockets

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use platform_service::domain::CallStatus;
use platform_service::realtime::TopicKind;

use crate::common::{assert_silent, expect_close, next_json, send_text, TestApp};

#[tokio::test]
async fn test_webrtc_signal_relayed_to_peers_only() {
    let app = TestApp::spawn().await;
    let (a_id, b_id, c_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let call_id = app.store.seed_call(&[a_id, b_id, c_id]);

    let mut a = app.connect(TopicKind::Call, call_id, a_id).await;
    let mut b = app.connect(TopicKind::Call, call_id, b_id).await;
    let mut c = app.connect(TopicKind::Call, call_id, c_id).await;

    let offer = json!({ "type": "webrtc-signal", "sdp": "v=0", "target": c_id });
    send_text(&mut a, &offer.to_string()).await;

    assert_eq!(next_json(&mut b).await, offer);
    assert_eq!(next_json(&mut c).await, offer);
    assert_silent(&mut a, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_transcript_persisted_and_echoed() {
    let app = TestApp::spawn().await;
    let (a_id, b_id) = (Uuid::new_v4(), Uuid::new_v4());
    let call_id = app.store.seed_call(&[a_id, b_id]);

    let mut a = app.connect(TopicKind::Call, call_id, a_id).await;
    let mut b = app.connect(TopicKind::Call, call_id, b_id).await;

    let line = json!({ "type": "speech-transcript", "text": "hello there", "timestamp": 1234 });
    send_text(&mut a, &line.to_string()).await;

    for ws in [&mut a, &mut b] {
        let notice = next_json(ws).await;
        assert_eq!(notice["type"], "transcript");
        assert_eq!(notice["text"], "hello there");
        assert_eq!(notice["user_id"], a_id.to_string());
        assert_eq!(notice["timestamp"], 1234);
    }

    let stored = app.store.transcript(call_id);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "hello there");
}

#[tokio::test]
async fn test_call_end_notifies_everyone_and_closes_sender() {
    let app = TestApp::spawn().await;
    let (a_id, b_id) = (Uuid::new_v4(), Uuid::new_v4());
    let call_id = app.store.seed_call(&[a_id, b_id]);

    let mut a = app.connect(TopicKind::Call, call_id, a_id).await;
    let mut b = app.connect(TopicKind::Call, call_id, b_id).await;

    send_text(&mut a, r#"{"type":"call-end"}"#).await;

    assert_eq!(next_json(&mut a).await["type"], "call-ended");
    assert_eq!(next_json(&mut b).await["type"], "call-ended");
    expect_close(&mut a).await;

    let call = app.store.call(call_id).unwrap();
    assert_eq!(call.status, CallStatus::Ended);
    assert!(call.ended_at.is_some());

    // The peer stays connected until it leaves on its own.
    app.wait_for_subscribers(TopicKind::Call, call_id, 1).await;
}

#[tokio::test]
async fn test_call_end_failure_keeps_connection() {
    let app = TestApp::spawn().await;
    let (a_id, b_id) = (Uuid::new_v4(), Uuid::new_v4());
    let call_id = app.store.seed_call(&[a_id, b_id]);

    let mut a = app.connect(TopicKind::Call, call_id, a_id).await;
    let mut b = app.connect(TopicKind::Call, call_id, b_id).await;
    app.store.fail_writes(true);

    send_text(&mut a, r#"{"type":"call-end"}"#).await;

    let error = next_json(&mut a).await;
    assert_eq!(error["code"], "persistence_failed");
    assert_eq!(error["kind"], "call-end");
    assert_silent(&mut b, Duration::from_millis(200)).await;
    assert_eq!(app.state.hub.registry(TopicKind::Call).subscriber_count(call_id), 2);
}

#[tokio::test]
async fn test_retained_room_survives_until_call_end() {
    let app = TestApp::spawn_with(|s| s.websocket.retain_empty_call_rooms = true).await;
    let (a_id, b_id) = (Uuid::new_v4(), Uuid::new_v4());
    let server = app.server();

    let response = server
        .post("/api/v1/calls")
        .authorization_bearer(app.token(a_id))
        .json(&json!({ "participants": [b_id] }))
        .await;
    let call_id: Uuid = response.json::<serde_json::Value>()["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let registry = app.state.hub.registry(TopicKind::Call).clone();
    assert!(registry.contains_topic(call_id));

    let b = app.connect(TopicKind::Call, call_id, b_id).await;
    drop(b);
    app.wait_for_subscribers(TopicKind::Call, call_id, 0).await;
    assert!(registry.contains_topic(call_id));

    let mut a = app.connect(TopicKind::Call, call_id, a_id).await;
    send_text(&mut a, r#"{"type":"call-end"}"#).await;
    expect_close(&mut a).await;
    app.wait_for_subscribers(TopicKind::Call, call_id, 0).await;
    assert!(!registry.contains_topic(call_id));
}
