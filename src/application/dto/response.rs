//! Response DTOs
//!
//! Data structures for API response bodies and outbound real-time frames.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Chat, Message, Profile};

/// Author display fields joined onto messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileDto {
    pub id: Uuid,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileDto {
    /// Placeholder for a user without a profile row.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            description: String::new(),
            avatar: None,
        }
    }
}

impl From<Profile> for ProfileDto {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            description: profile.description,
            avatar: profile.avatar,
        }
    }
}

/// Chat message enriched with its author's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ProfileDto>,
}

impl MessageDto {
    pub fn new(message: Message, author: Option<ProfileDto>) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            user_id: message.user_id,
            text: message.text,
            created_at: message.created_at,
            user: author,
        }
    }
}

/// Chat response with participant profiles
#[derive(Debug, Clone, Serialize)]
pub struct ChatDto {
    pub id: Uuid,
    pub users: Vec<ProfileDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatDto {
    pub fn new(chat: Chat, users: Vec<ProfileDto>) -> Self {
        Self {
            id: chat.id,
            users,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

/// Entry of the caller's chat list
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummaryDto {
    pub chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageDto>,
}
