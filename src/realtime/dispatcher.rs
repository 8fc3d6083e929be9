//! Message/Signal Router
//!
//! Classifies decoded inbound frames and runs the matching persistence and
//! broadcast steps. The dispatcher holds no per-connection state; everything
//! it needs arrives with the frame.

use chrono::Utc;
use uuid::Uuid;

use super::broadcast::Broadcaster;
use super::connection::ConnectionHandle;
use super::frames::{self, CallFrame, ChatFrame, FrameError, Notice};
use super::TopicKind;
use crate::application::dto::MessageDto;
use crate::application::services::load_author;
use crate::domain::Message;
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::Repositories;
use crate::shared::error::AppError;

/// What the reader loop should do after a frame was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Close,
}

/// Ordering between persistence and broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityPolicy {
    /// Only broadcast what was stored; the sender is told about failures.
    PersistThenBroadcast,
    /// Log persistence failures and broadcast anyway.
    BroadcastRegardless,
}

impl DurabilityPolicy {
    pub fn from_flag(broadcast_on_persist_failure: bool) -> Self {
        if broadcast_on_persist_failure {
            Self::BroadcastRegardless
        } else {
            Self::PersistThenBroadcast
        }
    }
}

pub struct Dispatcher {
    repos: Repositories,
    chat: Broadcaster,
    call: Broadcaster,
    durability: DurabilityPolicy,
}

impl Dispatcher {
    pub fn new(
        repos: Repositories,
        chat: Broadcaster,
        call: Broadcaster,
        durability: DurabilityPolicy,
    ) -> Self {
        Self {
            repos,
            chat,
            call,
            durability,
        }
    }

    /// Handle one inbound text frame from `conn` on `topic`.
    pub async fn dispatch(
        &self,
        kind: TopicKind,
        topic: Uuid,
        conn: &ConnectionHandle,
        raw: &str,
    ) -> Disposition {
        match kind {
            TopicKind::Chat => self.dispatch_chat(topic, conn, raw).await,
            TopicKind::Call => self.dispatch_call(topic, conn, raw).await,
        }
    }

    async fn dispatch_chat(&self, chat_id: Uuid, conn: &ConnectionHandle, raw: &str) -> Disposition {
        let frame = match frames::decode_chat_frame(raw) {
            Ok(frame) => frame,
            Err(e) => {
                drop_frame(TopicKind::Chat, chat_id, conn, &e);
                return Disposition::Continue;
            }
        };

        metrics::record_frame(TopicKind::Chat.as_str(), frame.kind());
        tracing::debug!(
            chat_id = %chat_id,
            user_id = %conn.user_id(),
            kind = frame.kind(),
            "Dispatching chat frame"
        );

        match frame {
            ChatFrame::Signal(_) => {
                self.chat
                    .broadcast(chat_id, Some(conn.user_id()), frames::relay(raw));
            }
            ChatFrame::Text(text) => self.chat_message(chat_id, conn, text).await,
        }

        Disposition::Continue
    }

    async fn chat_message(&self, chat_id: Uuid, conn: &ConnectionHandle, text: String) {
        let user_id = conn.user_id();

        let message = match self.repos.chats.create_message(chat_id, user_id, &text).await {
            Ok(message) => message,
            Err(e) => {
                log_persistence_failure("create_message", chat_id, user_id, &e);
                match self.durability {
                    DurabilityPolicy::PersistThenBroadcast => {
                        self.notify_failure(&self.chat, chat_id, conn, "chat-message");
                        return;
                    }
                    // Not stored, so it gets a transient id.
                    DurabilityPolicy::BroadcastRegardless => Message {
                        id: Uuid::now_v7(),
                        chat_id,
                        user_id,
                        text,
                        created_at: Utc::now(),
                    },
                }
            }
        };

        let author = load_author(self.repos.profiles.as_ref(), user_id).await;
        match frames::encode(&MessageDto::new(message, author)) {
            Ok(payload) => {
                self.chat.broadcast(chat_id, None, payload);
            }
            Err(e) => tracing::error!(chat_id = %chat_id, error = %e, "Failed to encode message"),
        }
    }

    async fn dispatch_call(&self, call_id: Uuid, conn: &ConnectionHandle, raw: &str) -> Disposition {
        let frame = match frames::decode_call_frame(raw) {
            Ok(frame) => frame,
            Err(e) => {
                drop_frame(TopicKind::Call, call_id, conn, &e);
                return Disposition::Continue;
            }
        };

        metrics::record_frame(TopicKind::Call.as_str(), frame.kind());
        tracing::debug!(
            call_id = %call_id,
            user_id = %conn.user_id(),
            kind = frame.kind(),
            "Dispatching call frame"
        );

        match frame {
            CallFrame::WebrtcSignal => {
                self.call
                    .broadcast(call_id, Some(conn.user_id()), frames::relay(raw));
                Disposition::Continue
            }
            CallFrame::SpeechTranscript { text, timestamp } => {
                self.transcript(call_id, conn, &text, timestamp).await;
                Disposition::Continue
            }
            CallFrame::CallEnd => self.end_call(call_id, conn).await,
            CallFrame::Unknown => Disposition::Continue,
        }
    }

    async fn transcript(
        &self,
        call_id: Uuid,
        conn: &ConnectionHandle,
        text: &str,
        timestamp: Option<serde_json::Value>,
    ) {
        let user_id = conn.user_id();

        if let Err(e) = self.repos.calls.add_transcript(call_id, user_id, text).await {
            log_persistence_failure("add_transcript", call_id, user_id, &e);
            if self.durability == DurabilityPolicy::PersistThenBroadcast {
                self.notify_failure(&self.call, call_id, conn, "speech-transcript");
                return;
            }
        }

        match frames::encode(&Notice::transcript(user_id, text, timestamp)) {
            Ok(payload) => {
                self.call.broadcast(call_id, None, payload);
            }
            Err(e) => tracing::error!(call_id = %call_id, error = %e, "Failed to encode transcript"),
        }
    }

    async fn end_call(&self, call_id: Uuid, conn: &ConnectionHandle) -> Disposition {
        let user_id = conn.user_id();

        if let Err(e) = self.repos.calls.end_call(call_id).await {
            log_persistence_failure("end_call", call_id, user_id, &e);
            if self.durability == DurabilityPolicy::PersistThenBroadcast {
                self.notify_failure(&self.call, call_id, conn, "call-end");
                return Disposition::Continue;
            }
        }

        match frames::encode(&Notice::CallEnded) {
            Ok(payload) => {
                let report = self.call.broadcast(call_id, None, payload);
                tracing::info!(
                    call_id = %call_id,
                    ended_by = %user_id,
                    notified = report.delivered,
                    "Call ended"
                );
            }
            Err(e) => tracing::error!(call_id = %call_id, error = %e, "Failed to encode call-ended"),
        }

        self.call.registry().retire_topic(call_id);
        Disposition::Close
    }

    fn notify_failure(&self, broadcaster: &Broadcaster, topic: Uuid, conn: &ConnectionHandle, kind: &str) {
        match frames::encode(&Notice::persistence_failed(kind)) {
            Ok(payload) => {
                broadcaster.send_to(topic, conn, payload);
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode error notice"),
        }
    }
}

fn drop_frame(kind: TopicKind, topic: Uuid, conn: &ConnectionHandle, error: &FrameError) {
    metrics::record_frame(kind.as_str(), error.label());
    tracing::debug!(
        topic_kind = kind.as_str(),
        topic = %topic,
        connection_id = %conn.id(),
        reason = %error,
        "Dropped inbound frame"
    );
}

fn log_persistence_failure(operation: &str, topic: Uuid, user_id: Uuid, error: &AppError) {
    metrics::record_persistence_failure(operation);
    tracing::error!(
        operation,
        topic = %topic,
        user_id = %user_id,
        error = %error,
        "Persistence failed"
    );
}
