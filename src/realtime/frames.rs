//! Frame codec
//!
//! Inbound frames are decoded into tagged variants before they reach the
//! dispatcher; anything that does not decode is reported as a
//! [`FrameError`] and dropped by the caller. Outbound notices are serialized
//! once per broadcast into a shared [`Payload`].

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::connection::Payload;
use crate::application::dto::request::MAX_MESSAGE_LENGTH;

/// Why an inbound frame was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("unknown frame kind")]
    UnknownKind,

    #[error("frame text exceeds {max} characters")]
    TooLarge { max: usize },
}

impl FrameError {
    /// Label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            FrameError::Empty => "empty",
            FrameError::Malformed(_) => "malformed",
            FrameError::UnknownKind => "unknown",
            FrameError::TooLarge { .. } => "too_large",
        }
    }
}

/// Call-invitation signals exchanged on chat topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatSignal {
    IncomingVideoCall,
    CallAccepted,
    CallDeclined,
    #[serde(other)]
    Unknown,
}

/// Decoded frame received on a chat topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatFrame {
    /// A message to persist and fan out
    Text(String),
    /// A signal relayed verbatim to the other participants
    Signal(ChatSignal),
}

impl ChatFrame {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatFrame::Text(_) => "text",
            ChatFrame::Signal(ChatSignal::IncomingVideoCall) => "incoming-video-call",
            ChatFrame::Signal(ChatSignal::CallAccepted) => "call-accepted",
            ChatFrame::Signal(ChatSignal::CallDeclined) => "call-declined",
            ChatFrame::Signal(ChatSignal::Unknown) => "unknown",
        }
    }
}

/// Decoded frame received on a call topic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CallFrame {
    /// SDP offers/answers and ICE candidates; relayed verbatim
    WebrtcSignal,
    SpeechTranscript {
        text: String,
        #[serde(default)]
        timestamp: Option<Value>,
    },
    CallEnd,
    #[serde(other)]
    Unknown,
}

impl CallFrame {
    pub fn kind(&self) -> &'static str {
        match self {
            CallFrame::WebrtcSignal => "webrtc-signal",
            CallFrame::SpeechTranscript { .. } => "speech-transcript",
            CallFrame::CallEnd => "call-end",
            CallFrame::Unknown => "unknown",
        }
    }
}

/// Decode a chat frame.
///
/// A JSON object carrying a `type` is a signal; a JSON object with a `text`
/// string is a message; any other non-JSON text is taken verbatim as a
/// message.
pub fn decode_chat_frame(raw: &str) -> Result<ChatFrame, FrameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FrameError::Empty);
    }

    if !trimmed.starts_with('{') {
        return text_frame(raw);
    }

    let value = parse_object(trimmed)?;
    if has_kind(&value)? {
        return match serde_json::from_value::<ChatSignal>(value) {
            Ok(ChatSignal::Unknown) => Err(FrameError::UnknownKind),
            Ok(signal) => Ok(ChatFrame::Signal(signal)),
            Err(e) => Err(FrameError::Malformed(e.to_string())),
        };
    }

    match value.get("text") {
        Some(Value::String(text)) if !text.trim().is_empty() => text_frame(text),
        Some(Value::String(_)) => Err(FrameError::Empty),
        _ => Err(FrameError::Malformed("missing `type` or `text`".into())),
    }
}

/// Decode a call frame.
pub fn decode_call_frame(raw: &str) -> Result<CallFrame, FrameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FrameError::Empty);
    }

    let value = parse_object(trimmed)?;
    if !has_kind(&value)? {
        return Err(FrameError::Malformed("missing `type`".into()));
    }

    match serde_json::from_value::<CallFrame>(value) {
        Ok(CallFrame::Unknown) => Err(FrameError::UnknownKind),
        Ok(CallFrame::SpeechTranscript { text, .. }) if text.trim().is_empty() => {
            Err(FrameError::Empty)
        }
        Ok(CallFrame::SpeechTranscript { text, .. })
            if text.chars().count() > MAX_MESSAGE_LENGTH as usize =>
        {
            Err(FrameError::TooLarge {
                max: MAX_MESSAGE_LENGTH as usize,
            })
        }
        Ok(frame) => Ok(frame),
        Err(e) => Err(FrameError::Malformed(e.to_string())),
    }
}

fn parse_object(raw: &str) -> Result<Value, FrameError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| FrameError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(FrameError::Malformed("expected a JSON object".into()));
    }
    Ok(value)
}

/// Whether the object carries a discriminator. Non-string discriminators are
/// rejected rather than matched by position.
fn has_kind(value: &Value) -> Result<bool, FrameError> {
    match value.get("type") {
        None => Ok(false),
        Some(Value::String(_)) => Ok(true),
        Some(_) => Err(FrameError::Malformed("`type` must be a string".into())),
    }
}

fn text_frame(text: &str) -> Result<ChatFrame, FrameError> {
    if text.chars().count() > MAX_MESSAGE_LENGTH as usize {
        return Err(FrameError::TooLarge {
            max: MAX_MESSAGE_LENGTH as usize,
        });
    }
    Ok(ChatFrame::Text(text.to_owned()))
}

/// Server-originated notices.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notice<'a> {
    Transcript {
        user_id: Uuid,
        text: &'a str,
        timestamp: Value,
    },
    CallEnded,
    Error {
        code: &'static str,
        kind: &'a str,
    },
}

impl<'a> Notice<'a> {
    /// Transcript notice; falls back to the server clock when the client did
    /// not stamp the entry.
    pub fn transcript(user_id: Uuid, text: &'a str, timestamp: Option<Value>) -> Self {
        Notice::Transcript {
            user_id,
            text,
            timestamp: timestamp.unwrap_or_else(|| Value::String(Utc::now().to_rfc3339())),
        }
    }

    /// Sent to the sender alone when persisting its frame failed.
    pub fn persistence_failed(kind: &'a str) -> Self {
        Notice::Error {
            code: "persistence_failed",
            kind,
        }
    }
}

/// Serialize any outbound value into a shareable payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Payload, serde_json::Error> {
    serde_json::to_string(value).map(Arc::from)
}

/// Wrap an inbound frame for verbatim relay.
pub fn relay(raw: &str) -> Payload {
    Arc::from(raw)
}
