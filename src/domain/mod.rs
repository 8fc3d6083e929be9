//! # Domain Layer
//!
//! The domain layer contains the core business types of the platform's
//! messaging subsystem. It is independent of any external frameworks or
//! infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Chats, messages, calls, transcripts and profile summaries,
//!   together with the repository traits that persist them
//! - **value_objects**: Immutable value types (Page)

pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
