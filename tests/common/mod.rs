//! Common Test Utilities
//!
//! In-memory repositories, a server bound on an ephemeral port and
//! WebSocket client helpers.

#![allow(dead_code)]

mod memory;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use fake::{faker::name::en::Name, Fake};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use platform_service::application::services::{AuthService, JwtAuthService};
use platform_service::config::{
    CorsSettings, DatabaseSettings, JwtSettings, ServerSettings, Settings, WebSocketSettings,
};
use platform_service::presentation::http::create_router;
use platform_service::realtime::TopicKind;
use platform_service::startup::AppState;

pub use memory::MemoryStore;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a client waits for a frame it expects
pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "postgres://unused".into(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
            tx_timeout_ms: 1_000,
        },
        jwt: JwtSettings {
            secret: "integration-test-secret-0123456789abcdef".into(),
            access_token_expiry_minutes: 5,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        websocket: WebSocketSettings::default(),
        log_format: "pretty".into(),
        environment: "test".into(),
    }
}

/// A running server backed by a [`MemoryStore`]
pub struct TestApp {
    pub addr: SocketAddr,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = test_settings();
        configure(&mut settings);

        let store = Arc::new(MemoryStore::default());
        let state = AppState::new(settings, store.repositories(), None);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = create_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state, store }
    }

    /// In-process client sharing this app's hub and store
    pub fn server(&self) -> TestServer {
        TestServer::new(create_router(self.state.clone())).unwrap()
    }

    pub fn token(&self, user_id: Uuid) -> String {
        JwtAuthService::new(self.state.settings.jwt.clone())
            .issue_access_token(user_id)
            .unwrap()
            .access_token
    }

    pub fn ws_url(&self, kind: TopicKind, topic: Uuid, token: &str) -> String {
        format!(
            "ws://{}/api/v1/{}/{}/ws?token={}",
            self.addr,
            kind.as_str(),
            topic,
            token
        )
    }

    /// Open a socket for `user_id` and wait until the hub has registered it
    pub async fn connect(&self, kind: TopicKind, topic: Uuid, user_id: Uuid) -> WsClient {
        let before = self.state.hub.registry(kind).subscriber_count(topic);
        let url = self.ws_url(kind, topic, &self.token(user_id));
        let (ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        self.wait_for_subscribers(kind, topic, before + 1).await;
        ws
    }

    pub async fn wait_for_subscribers(&self, kind: TopicKind, topic: Uuid, expected: usize) {
        let registry = self.state.hub.registry(kind).clone();
        tokio::time::timeout(RECV_TIMEOUT, async move {
            while registry.subscriber_count(topic) != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("subscriber count never reached the expected value");
    }
}

/// A random display name for seeded profiles
pub fn fake_name() -> String {
    Name().fake()
}

pub async fn send_text(ws: &mut WsClient, text: &str) {
    ws.send(WsMessage::text(text)).await.unwrap();
}

/// Next text frame parsed as JSON; control frames are skipped
pub async fn next_json(ws: &mut WsClient) -> Value {
    let text = tokio::time::timeout(RECV_TIMEOUT, next_text(ws))
        .await
        .expect("timed out waiting for a frame")
        .expect("socket closed before a frame arrived");
    serde_json::from_str(&text).unwrap()
}

async fn next_text(ws: &mut WsClient) -> Option<String> {
    while let Some(msg) = ws.next().await {
        match msg.ok()? {
            WsMessage::Text(text) => return Some(text.as_str().to_owned()),
            WsMessage::Close(_) => return None,
            _ => continue,
        }
    }
    None
}

/// Assert that no text frame arrives within `window`
pub async fn assert_silent(ws: &mut WsClient, window: Duration) {
    if let Ok(Some(text)) = tokio::time::timeout(window, next_text(ws)).await {
        panic!("unexpected frame: {text}");
    }
}

/// Wait for the server to close the socket
pub async fn expect_close(ws: &mut WsClient) {
    let closed = tokio::time::timeout(RECV_TIMEOUT, async {
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(WsMessage::Close(_)) | Err(_) => return,
                Ok(_) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "server did not close the socket");
}
