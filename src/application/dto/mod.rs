//! Data Transfer Objects
//!
//! DTOs for API request/response serialization. The response shapes are also
//! the payloads pushed over real-time connections.

pub mod request;
pub mod response;

pub use request::{CreateCallRequest, CreateChatRequest, SendMessageRequest, WsQueryParams};
pub use response::{ChatDto, ChatSummaryDto, MessageDto, ProfileDto};
