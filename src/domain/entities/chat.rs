//! Chat entity and repository trait.
//!
//! Maps to the `chats` and `chat_users` tables in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;
use crate::shared::error::AppError;

/// A conversation between a fixed set of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    /// Participant user IDs
    pub users: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Bumped every time a message is written
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Check whether a user takes part in this chat.
    pub fn has_user(&self, user_id: Uuid) -> bool {
        self.users.contains(&user_id)
    }
}

/// A chat together with its most recent message, as listed for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatWithLastMessage {
    pub chat: Chat,
    pub last_message: Option<Message>,
}

/// Repository trait for chat and message data access.
///
/// Every operation runs in its own transaction. Operations addressing a chat
/// that does not exist fail with [`AppError::NotFound`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Create a chat with the given participants.
    async fn create_chat(&self, user_ids: &[Uuid]) -> Result<Chat, AppError>;

    /// List the chats a user takes part in, most recently updated first.
    async fn find_user_chats(&self, user_id: Uuid) -> Result<Vec<ChatWithLastMessage>, AppError>;

    /// Persist a message and bump the chat's `updated_at`.
    async fn create_message(&self, chat_id: Uuid, user_id: Uuid, text: &str) -> Result<Message, AppError>;

    /// Page through a chat's messages, newest first.
    async fn find_messages(&self, chat_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Message>, AppError>;

    /// Get the participant user IDs of a chat.
    async fn find_participants(&self, chat_id: Uuid) -> Result<Vec<Uuid>, AppError>;
}
