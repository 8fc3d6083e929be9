//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{
    AuthService, CallService, CallServiceImpl, ChatService, ChatServiceImpl, JwtAuthService,
};
use crate::config::Settings;
use crate::infrastructure::database::{self, TransactionManager};
use crate::infrastructure::repositories::Repositories;
use crate::presentation::http::{create_router, handlers::health};
use crate::realtime::RealtimeHub;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Pool used by readiness checks; `None` when repositories are not
    /// database-backed
    pub db: Option<PgPool>,
    pub auth: Arc<dyn AuthService>,
    pub chats: Arc<dyn ChatService>,
    pub calls: Arc<dyn CallService>,
    pub hub: Arc<RealtimeHub>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire services and the real-time hub around a set of repositories
    pub fn new(settings: Settings, repos: Repositories, db: Option<PgPool>) -> Self {
        let hub = Arc::new(RealtimeHub::new(repos.clone(), settings.websocket.clone()));
        let auth = Arc::new(JwtAuthService::new(settings.jwt.clone()));
        let chats = Arc::new(ChatServiceImpl::new(repos.clone(), hub.clone()));
        let calls = Arc::new(CallServiceImpl::new(repos, hub.clone()));

        Self {
            db,
            auth,
            chats,
            calls,
            hub,
            settings: Arc::new(settings),
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        let tx = TransactionManager::new(db.clone(), settings.database.tx_timeout());
        let repos = Repositories::postgres(tx);

        Self::build_with(settings, repos, Some(db)).await
    }

    /// Build the application around caller-supplied repositories
    pub async fn build_with(settings: Settings, repos: Repositories, db: Option<PgPool>) -> Result<Self> {
        health::init_server_start();

        let addr = settings.server_addr();
        let state = AppState::new(settings, repos, db);
        let router = create_router(state);

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self { listener, router })
    }

    /// Run the server until Ctrl+C
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
