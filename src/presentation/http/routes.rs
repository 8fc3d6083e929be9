//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, create_cors_layer, create_trace_layer, track_metrics};
use crate::presentation::websocket::{call_ws_handler, chat_ws_handler};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let cors = create_cors_layer(&state.settings.cors);

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .layer(cors)
        .layer(create_trace_layer())
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Protected routes (require a bearer token)
        .nest("/chats", chat_routes(state.clone()))
        .nest("/calls", call_routes(state))
        // Real-time upgrades authenticate themselves so browsers can pass
        // the token as a query parameter
        .merge(realtime_routes())
}

/// Chat routes (protected)
fn chat_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::chat::list_chats).post(handlers::chat::create_chat),
        )
        .route(
            "/{chat_id}/messages",
            get(handlers::chat::get_messages).post(handlers::chat::send_message),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Call routes (protected)
fn call_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::call::create_call))
        .route("/history", get(handlers::call::call_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// WebSocket upgrade endpoints
fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/{chat_id}/ws", get(chat_ws_handler))
        .route("/call/{call_id}/ws", get(call_ws_handler))
}
