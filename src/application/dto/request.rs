//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Maximum chat message length in characters
pub const MAX_MESSAGE_LENGTH: u64 = 4000;

/// Create chat request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChatRequest {
    #[validate(length(max = 100, message = "A chat can have at most 100 users"))]
    #[serde(default)]
    pub users: Vec<Uuid>,
}

/// Send message request
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(
        length(min = 1, max = 4000, message = "Text must be 1-4000 characters"),
        custom(function = "not_blank")
    )]
    pub text: String,
}

fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Text must not be blank".into()));
    }
    Ok(())
}

/// Create call request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCallRequest {
    #[validate(length(min = 1, max = 100, message = "Participants must contain 1-100 users"))]
    pub participants: Vec<Uuid>,
}

/// Query parameters accepted on real-time upgrade requests
#[derive(Debug, Default, Deserialize)]
pub struct WsQueryParams {
    pub token: Option<String>,
}
