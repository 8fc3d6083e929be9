//! Call entity and repository trait.
//!
//! Maps to the `calls`, `call_participants` and `call_transcripts` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Call status matching the `calls.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    #[default]
    Active,
    Ended,
}

impl CallStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ended" => Self::Ended,
            _ => Self::Active,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A call participant with the profile fields shown in call history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallParticipant {
    pub id: Uuid,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Represents a call.
///
/// Maps to the `calls` table:
/// - id: UUID PRIMARY KEY DEFAULT gen_random_uuid()
/// - status: VARCHAR NOT NULL DEFAULT 'active'
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - ended_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: Uuid,
    pub participants: Vec<CallParticipant>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: CallStatus,
}

impl Call {
    /// Check whether a user takes part in this call.
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }
}

/// One persisted line of a call transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub user: CallParticipant,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A call together with its full transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallWithTranscript {
    pub call: Call,
    pub transcript: Vec<TranscriptEntry>,
}

/// Repository trait for call data access.
///
/// Operations addressing a call that does not exist fail with
/// [`AppError::NotFound`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Create an active call with the given participants.
    async fn create_call(&self, participant_ids: &[Uuid]) -> Result<Call, AppError>;

    /// Get the participants of a call.
    async fn find_participants(&self, call_id: Uuid) -> Result<Vec<CallParticipant>, AppError>;

    /// Append a transcript line. Transcripts are never rewritten.
    async fn add_transcript(&self, call_id: Uuid, user_id: Uuid, text: &str) -> Result<(), AppError>;

    /// Mark a call as ended.
    async fn end_call(&self, call_id: Uuid) -> Result<(), AppError>;

    /// Page through the calls a user took part in, newest first.
    async fn find_call_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CallWithTranscript>, AppError>;
}
