//! Profile summary and repository trait.
//!
//! Profiles are owned by the profile CRUD surface; the messaging subsystem
//! only reads the display fields it joins onto outbound payloads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Display fields of a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Read access to profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find a profile by its user ID.
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<Profile>, AppError>;
}
