//! Chat Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::{ChatDto, ChatSummaryDto, CreateChatRequest, MessageDto, SendMessageRequest};
use crate::domain::{Page, PageQuery};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Messages returned per page when no limit is given
pub const DEFAULT_MESSAGE_PAGE: i64 = 10;

/// Create a chat
pub async fn create_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatDto>), AppError> {
    let chat = state.chats.create_chat(auth.user_id, body.users).await?;

    tracing::info!(chat_id = %chat.id, user_id = %auth.user_id, "Chat created");

    Ok((StatusCode::CREATED, Json(chat)))
}

/// List the caller's chats
pub async fn list_chats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ChatSummaryDto>>, AppError> {
    let chats = state.chats.list_chats(auth.user_id).await?;
    Ok(Json(chats))
}

/// Get messages from a chat
pub async fn get_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<MessageDto>>, AppError> {
    let page = Page::resolve(query, DEFAULT_MESSAGE_PAGE);
    let messages = state.chats.get_messages(auth.user_id, chat_id, page).await?;
    Ok(Json(messages))
}

/// Send a message to a chat
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(chat_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageDto>), AppError> {
    let message = state
        .chats
        .send_message(auth.user_id, chat_id, &body.text)
        .await?;

    tracing::debug!(
        message_id = %message.id,
        chat_id = %chat_id,
        user_id = %auth.user_id,
        "Message sent"
    );

    Ok((StatusCode::CREATED, Json(message)))
}
