//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod call;
pub mod chat;
pub mod health;
