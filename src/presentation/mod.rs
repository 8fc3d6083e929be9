//! Presentation Layer
//!
//! HTTP routes and WebSocket upgrade handlers.

pub mod http;
pub mod middleware;
pub mod websocket;
