//! WebSocket Upgrade Handlers
//!
//! Authenticates the caller, checks topic membership and hands the upgraded
//! socket to a connection pump.

use axum::{
    extract::{ws::WebSocket, Path, Query, State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use futures::StreamExt;
use uuid::Uuid;

use crate::application::dto::WsQueryParams;
use crate::application::services::AuthError;
use crate::presentation::middleware::bearer_token;
use crate::realtime::TopicKind;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Upgrade handler for `/chat/{chat_id}/ws`
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Query(params): Query<WsQueryParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user_id = authenticate(&state, &params, &headers)?;
    state.chats.authorize_participant(user_id, chat_id).await?;

    Ok(upgrade(ws, state, TopicKind::Chat, chat_id, user_id))
}

/// Upgrade handler for `/call/{call_id}/ws`
pub async fn call_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(call_id): Path<Uuid>,
    Query(params): Query<WsQueryParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user_id = authenticate(&state, &params, &headers)?;
    state.calls.authorize_participant(user_id, call_id).await?;

    Ok(upgrade(ws, state, TopicKind::Call, call_id, user_id))
}

/// Resolve the caller from `?token=` or, failing that, the bearer header.
fn authenticate(state: &AppState, params: &WsQueryParams, headers: &HeaderMap) -> Result<Uuid, AppError> {
    let token = params
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(headers))
        .ok_or(AuthError::MissingToken)?;

    state.auth.validate_token(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected real-time upgrade");
        AppError::from(e)
    })
}

fn upgrade(ws: WebSocketUpgrade, state: AppState, kind: TopicKind, topic: Uuid, user_id: Uuid) -> Response {
    ws.max_message_size(state.settings.websocket.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, kind, topic, user_id))
}

/// Drive one upgraded connection until it closes
async fn handle_socket(socket: WebSocket, state: AppState, kind: TopicKind, topic: Uuid, user_id: Uuid) {
    let pump = state.hub.connect(kind, topic, user_id);
    let connection_id = pump.handle().id();

    let (sink, stream) = socket.split();
    let reason = pump.run(sink, stream).await;

    tracing::debug!(
        connection_id = %connection_id,
        reason = %reason,
        "Socket handler finished"
    );
}
