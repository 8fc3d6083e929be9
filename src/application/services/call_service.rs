//! Call Service
//!
//! Call creation, history and participant checks for call rooms.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Call, CallWithTranscript, Page};
use crate::infrastructure::repositories::Repositories;
use crate::realtime::RealtimeHub;
use crate::shared::error::AppError;

/// Call service trait
#[async_trait]
pub trait CallService: Send + Sync {
    /// Create an active call; the caller is appended to the participants
    async fn create_call(&self, caller: Uuid, participants: Vec<Uuid>) -> Result<Call, CallError>;

    /// Calls the caller took part in, newest first, with transcripts
    async fn history(&self, caller: Uuid, page: Page) -> Result<Vec<CallWithTranscript>, CallError>;

    /// Check that the caller takes part in the call
    async fn authorize_participant(&self, caller: Uuid, call_id: Uuid) -> Result<(), CallError>;
}

/// Call service errors
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Call not found")]
    NotFound,

    #[error("Not a participant of this call")]
    NotParticipant,

    #[error("A call needs at least one other participant")]
    NoParticipants,

    #[error(transparent)]
    Repository(AppError),
}

impl From<AppError> for CallError {
    fn from(err: AppError) -> Self {
        if err.is_not_found() {
            CallError::NotFound
        } else {
            CallError::Repository(err)
        }
    }
}

impl From<CallError> for AppError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::NotFound => AppError::NotFound("Call not found".into()),
            CallError::NotParticipant => AppError::Forbidden("Not a participant of this call".into()),
            CallError::NoParticipants => {
                AppError::BadRequest("A call needs at least one other participant".into())
            }
            CallError::Repository(e) => e,
        }
    }
}

/// CallService implementation
pub struct CallServiceImpl {
    repos: Repositories,
    hub: Arc<RealtimeHub>,
}

impl CallServiceImpl {
    pub fn new(repos: Repositories, hub: Arc<RealtimeHub>) -> Self {
        Self { repos, hub }
    }
}

#[async_trait]
impl CallService for CallServiceImpl {
    async fn create_call(&self, caller: Uuid, participants: Vec<Uuid>) -> Result<Call, CallError> {
        let mut ids = Vec::with_capacity(participants.len() + 1);
        for id in participants.into_iter().chain(std::iter::once(caller)) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.len() < 2 {
            return Err(CallError::NoParticipants);
        }

        let call = self.repos.calls.create_call(&ids).await?;
        self.hub.open_call_room(call.id);

        tracing::info!(
            call_id = %call.id,
            created_by = %caller,
            participants = call.participants.len(),
            "Call created"
        );

        Ok(call)
    }

    async fn history(&self, caller: Uuid, page: Page) -> Result<Vec<CallWithTranscript>, CallError> {
        Ok(self
            .repos
            .calls
            .find_call_history(caller, page.limit, page.offset)
            .await?)
    }

    async fn authorize_participant(&self, caller: Uuid, call_id: Uuid) -> Result<(), CallError> {
        let participants = self.repos.calls.find_participants(call_id).await?;
        if participants.iter().any(|p| p.id == caller) {
            Ok(())
        } else {
            Err(CallError::NotParticipant)
        }
    }
}
