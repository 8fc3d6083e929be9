//! Application Layer
//!
//! Services consumed by the HTTP handlers and WebSocket upgrades, plus the
//! request and response DTOs they exchange. Services talk to the domain
//! repositories and push outbound payloads through the real-time hub.

pub mod dto;
pub mod services;
