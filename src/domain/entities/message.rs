//! Message entity.
//!
//! Maps to the `messages` table in the database schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a message in a chat.
///
/// Maps to the `messages` table:
/// - id: UUID PRIMARY KEY DEFAULT gen_random_uuid()
/// - chat_id: UUID NOT NULL REFERENCES chats(id)
/// - user_id: UUID NOT NULL (author)
/// - text: TEXT NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Messages are immutable once written and never deleted by the messaging
/// subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    /// Author user ID
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Get the text length in characters.
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }
}
