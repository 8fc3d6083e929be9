//! In-memory persistence gateway

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use platform_service::domain::{
    Call, CallParticipant, CallRepository, CallStatus, CallWithTranscript, Chat, ChatRepository,
    ChatWithLastMessage, Message, Profile, ProfileRepository, TranscriptEntry,
};
use platform_service::infrastructure::repositories::Repositories;
use platform_service::shared::error::AppError;

#[derive(Default)]
pub struct MemoryStore {
    chats: Mutex<HashMap<Uuid, Chat>>,
    messages: Mutex<Vec<Message>>,
    calls: Mutex<HashMap<Uuid, Call>>,
    transcripts: Mutex<HashMap<Uuid, Vec<TranscriptEntry>>>,
    profiles: Mutex<HashMap<Uuid, Profile>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            chats: self.clone(),
            calls: self.clone(),
            profiles: self.clone(),
        }
    }

    pub fn add_profile(&self, id: Uuid, description: &str) {
        self.profiles.lock().insert(
            id,
            Profile {
                id,
                description: description.into(),
                avatar: None,
            },
        );
    }

    /// Make every write fail until switched back
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn seed_chat(&self, users: &[Uuid]) -> Uuid {
        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4(),
            users: users.to_vec(),
            created_at: now,
            updated_at: now,
        };
        let id = chat.id;
        self.chats.lock().insert(id, chat);
        id
    }

    pub fn seed_call(&self, users: &[Uuid]) -> Uuid {
        let call = self.new_call(users);
        let id = call.id;
        self.calls.lock().insert(id, call);
        id
    }

    pub fn messages_in(&self, chat_id: Uuid) -> Vec<Message> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn call(&self, call_id: Uuid) -> Option<Call> {
        self.calls.lock().get(&call_id).cloned()
    }

    pub fn transcript(&self, call_id: Uuid) -> Vec<TranscriptEntry> {
        self.transcripts
            .lock()
            .get(&call_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check_writes(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(AppError::Internal("store unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn participant(&self, id: Uuid) -> CallParticipant {
        match self.profiles.lock().get(&id) {
            Some(p) => CallParticipant {
                id,
                description: p.description.clone(),
                avatar: p.avatar.clone(),
            },
            None => CallParticipant {
                id,
                description: String::new(),
                avatar: None,
            },
        }
    }

    fn new_call(&self, users: &[Uuid]) -> Call {
        Call {
            id: Uuid::new_v4(),
            participants: users.iter().map(|&id| self.participant(id)).collect(),
            created_at: Utc::now(),
            ended_at: None,
            status: CallStatus::Active,
        }
    }
}

fn chat_not_found() -> AppError {
    AppError::NotFound("Chat not found".into())
}

fn call_not_found() -> AppError {
    AppError::NotFound("Call not found".into())
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn create_chat(&self, user_ids: &[Uuid]) -> Result<Chat, AppError> {
        self.check_writes()?;
        let id = self.seed_chat(user_ids);
        self.chats.lock().get(&id).cloned().ok_or_else(chat_not_found)
    }

    async fn find_user_chats(&self, user_id: Uuid) -> Result<Vec<ChatWithLastMessage>, AppError> {
        let chats: Vec<Chat> = self
            .chats
            .lock()
            .values()
            .filter(|c| c.has_user(user_id))
            .cloned()
            .collect();

        let mut listed: Vec<ChatWithLastMessage> = chats
            .into_iter()
            .map(|chat| {
                let last_message = self.messages_in(chat.id).pop();
                ChatWithLastMessage { chat, last_message }
            })
            .collect();
        listed.sort_by(|a, b| b.chat.updated_at.cmp(&a.chat.updated_at));
        Ok(listed)
    }

    async fn create_message(&self, chat_id: Uuid, user_id: Uuid, text: &str) -> Result<Message, AppError> {
        self.check_writes()?;
        let now = Utc::now();
        {
            let mut chats = self.chats.lock();
            let chat = chats.get_mut(&chat_id).ok_or_else(chat_not_found)?;
            chat.updated_at = now;
        }
        let message = Message {
            id: Uuid::new_v4(),
            chat_id,
            user_id,
            text: text.into(),
            created_at: now,
        };
        self.messages.lock().push(message.clone());
        Ok(message)
    }

    async fn find_messages(&self, chat_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Message>, AppError> {
        if !self.chats.lock().contains_key(&chat_id) {
            return Err(chat_not_found());
        }
        Ok(self
            .messages_in(chat_id)
            .into_iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_participants(&self, chat_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        self.chats
            .lock()
            .get(&chat_id)
            .map(|c| c.users.clone())
            .ok_or_else(chat_not_found)
    }
}

#[async_trait]
impl CallRepository for MemoryStore {
    async fn create_call(&self, participant_ids: &[Uuid]) -> Result<Call, AppError> {
        self.check_writes()?;
        let call = self.new_call(participant_ids);
        self.calls.lock().insert(call.id, call.clone());
        Ok(call)
    }

    async fn find_participants(&self, call_id: Uuid) -> Result<Vec<CallParticipant>, AppError> {
        self.calls
            .lock()
            .get(&call_id)
            .map(|c| c.participants.clone())
            .ok_or_else(call_not_found)
    }

    async fn add_transcript(&self, call_id: Uuid, user_id: Uuid, text: &str) -> Result<(), AppError> {
        self.check_writes()?;
        if !self.calls.lock().contains_key(&call_id) {
            return Err(call_not_found());
        }
        let entry = TranscriptEntry {
            user: self.participant(user_id),
            text: text.into(),
            timestamp: Utc::now(),
        };
        self.transcripts.lock().entry(call_id).or_default().push(entry);
        Ok(())
    }

    async fn end_call(&self, call_id: Uuid) -> Result<(), AppError> {
        self.check_writes()?;
        let mut calls = self.calls.lock();
        let call = calls.get_mut(&call_id).ok_or_else(call_not_found)?;
        call.status = CallStatus::Ended;
        call.ended_at = Some(Utc::now());
        Ok(())
    }

    async fn find_call_history(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CallWithTranscript>, AppError> {
        let mut calls: Vec<Call> = self
            .calls
            .lock()
            .values()
            .filter(|c| c.participants.iter().any(|p| p.id == user_id))
            .cloned()
            .collect();
        calls.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(calls
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|call| {
                let transcript = self.transcript(call.id);
                CallWithTranscript { call, transcript }
            })
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self.profiles.lock().get(&user_id).cloned())
    }
}
