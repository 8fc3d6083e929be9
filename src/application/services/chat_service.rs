//! Chat Service
//!
//! Chat creation, listing, history and message sending over REST. Sent
//! messages are persisted first and then pushed to every live connection on
//! the chat topic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dto::{ChatDto, ChatSummaryDto, MessageDto, ProfileDto};
use crate::domain::{Message, Page, ProfileRepository};
use crate::infrastructure::repositories::Repositories;
use crate::realtime::{frames, RealtimeHub, TopicKind};
use crate::shared::error::AppError;

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Create a chat; the caller is always a participant
    async fn create_chat(&self, caller: Uuid, users: Vec<Uuid>) -> Result<ChatDto, ChatError>;

    /// List the caller's chats with their last message
    async fn list_chats(&self, caller: Uuid) -> Result<Vec<ChatSummaryDto>, ChatError>;

    /// Page through a chat's messages, newest first
    async fn get_messages(&self, caller: Uuid, chat_id: Uuid, page: Page) -> Result<Vec<MessageDto>, ChatError>;

    /// Persist a message and push it to the chat topic
    async fn send_message(&self, caller: Uuid, chat_id: Uuid, text: &str) -> Result<MessageDto, ChatError>;

    /// Check that the caller takes part in the chat
    async fn authorize_participant(&self, caller: Uuid, chat_id: Uuid) -> Result<(), ChatError>;
}

/// Chat service errors
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat not found")]
    NotFound,

    #[error("Not a participant of this chat")]
    NotParticipant,

    #[error(transparent)]
    Repository(AppError),
}

impl From<AppError> for ChatError {
    fn from(err: AppError) -> Self {
        if err.is_not_found() {
            ChatError::NotFound
        } else {
            ChatError::Repository(err)
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotFound => AppError::NotFound("Chat not found".into()),
            ChatError::NotParticipant => AppError::Forbidden("Not a participant of this chat".into()),
            ChatError::Repository(e) => e,
        }
    }
}

/// Look up the author fields joined onto outbound messages.
///
/// Lookup failures are logged and yield `None`; a message is never held back
/// for want of a profile.
pub async fn load_author(profiles: &dyn ProfileRepository, user_id: Uuid) -> Option<ProfileDto> {
    match profiles.find_by_id(user_id).await {
        Ok(profile) => profile.map(ProfileDto::from),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Profile lookup failed");
            None
        }
    }
}

/// ChatService implementation
pub struct ChatServiceImpl {
    repos: Repositories,
    hub: Arc<RealtimeHub>,
}

impl ChatServiceImpl {
    pub fn new(repos: Repositories, hub: Arc<RealtimeHub>) -> Self {
        Self { repos, hub }
    }

    /// Enrich messages, looking each author up once.
    async fn enrich(&self, messages: Vec<Message>) -> Vec<MessageDto> {
        let mut authors: HashMap<Uuid, Option<ProfileDto>> = HashMap::new();
        let mut enriched = Vec::with_capacity(messages.len());

        for message in messages {
            let author = match authors.get(&message.user_id) {
                Some(author) => author.clone(),
                None => {
                    let author = load_author(self.repos.profiles.as_ref(), message.user_id).await;
                    authors.insert(message.user_id, author.clone());
                    author
                }
            };
            enriched.push(MessageDto::new(message, author));
        }

        enriched
    }
}

#[async_trait]
impl ChatService for ChatServiceImpl {
    async fn create_chat(&self, caller: Uuid, users: Vec<Uuid>) -> Result<ChatDto, ChatError> {
        let mut participants = Vec::with_capacity(users.len() + 1);
        for user in std::iter::once(caller).chain(users) {
            if !participants.contains(&user) {
                participants.push(user);
            }
        }

        let chat = self.repos.chats.create_chat(&participants).await?;

        let mut profiles = Vec::with_capacity(chat.users.len());
        for &user in &chat.users {
            let profile = load_author(self.repos.profiles.as_ref(), user)
                .await
                .unwrap_or_else(|| ProfileDto::unknown(user));
            profiles.push(profile);
        }

        tracing::info!(chat_id = %chat.id, created_by = %caller, users = chat.users.len(), "Chat created");

        Ok(ChatDto::new(chat, profiles))
    }

    async fn list_chats(&self, caller: Uuid) -> Result<Vec<ChatSummaryDto>, ChatError> {
        let chats = self.repos.chats.find_user_chats(caller).await?;

        let mut summaries = Vec::with_capacity(chats.len());
        for entry in chats {
            let last_message = match entry.last_message {
                Some(message) => self.enrich(vec![message]).await.pop(),
                None => None,
            };
            summaries.push(ChatSummaryDto {
                chat: entry.chat,
                last_message,
            });
        }

        Ok(summaries)
    }

    async fn get_messages(&self, caller: Uuid, chat_id: Uuid, page: Page) -> Result<Vec<MessageDto>, ChatError> {
        self.authorize_participant(caller, chat_id).await?;

        let messages = self
            .repos
            .chats
            .find_messages(chat_id, page.limit, page.offset)
            .await?;

        Ok(self.enrich(messages).await)
    }

    async fn send_message(&self, caller: Uuid, chat_id: Uuid, text: &str) -> Result<MessageDto, ChatError> {
        self.authorize_participant(caller, chat_id).await?;

        let message = self.repos.chats.create_message(chat_id, caller, text).await?;
        let author = load_author(self.repos.profiles.as_ref(), caller).await;
        let dto = MessageDto::new(message, author);

        match frames::encode(&dto) {
            Ok(payload) => {
                self.hub
                    .broadcaster(TopicKind::Chat)
                    .broadcast(chat_id, None, payload);
            }
            Err(e) => tracing::error!(chat_id = %chat_id, error = %e, "Failed to encode message"),
        }

        Ok(dto)
    }

    async fn authorize_participant(&self, caller: Uuid, chat_id: Uuid) -> Result<(), ChatError> {
        let participants = self.repos.chats.find_participants(chat_id).await?;
        if participants.contains(&caller) {
            Ok(())
        } else {
            Err(ChatError::NotParticipant)
        }
    }
}
