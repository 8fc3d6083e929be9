//! WebSocket Endpoints
//!
//! Upgrade handlers binding sockets to chat and call topics.

pub mod handler;

pub use handler::{call_ws_handler, chat_ws_handler};
