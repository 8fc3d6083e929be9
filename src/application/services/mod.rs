//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Access token validation and issuance
//! - **ChatService**: Chats, message history and REST message sending
//! - **CallService**: Call creation, history and participant checks

pub mod auth_service;
pub mod call_service;
pub mod chat_service;

pub use auth_service::{AuthError, AuthService, AuthTokens, Claims, JwtAuthService};
pub use call_service::{CallError, CallService, CallServiceImpl};
pub use chat_service::{load_author, ChatError, ChatService, ChatServiceImpl};
