//! # Domain Entities
//!
//! Core domain entities of the chat and call subsystem. All entities map
//! directly to their corresponding database tables.
//!
//! - **Chat**: A conversation between a fixed set of users
//! - **Message**: A text message persisted in a chat
//! - **Call**: A call room with participants, a status and a transcript
//! - **Profile**: The display fields of a user joined onto outbound payloads
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access
//! operations. Together they form the persistence gateway consumed by the
//! real-time layer; implementations live in the infrastructure layer.

mod call;
mod chat;
mod message;
mod profile;

pub use call::{Call, CallParticipant, CallRepository, CallStatus, CallWithTranscript, TranscriptEntry};
pub use chat::{Chat, ChatRepository, ChatWithLastMessage};
pub use message::Message;
pub use profile::{Profile, ProfileRepository};

#[cfg(test)]
pub use call::MockCallRepository;
#[cfg(test)]
pub use chat::MockChatRepository;
#[cfg(test)]
pub use profile::MockProfileRepository;
