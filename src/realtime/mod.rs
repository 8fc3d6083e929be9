//! # Realtime Layer
//!
//! In-process fan-out for chat and call topics.
//!
//! - **registry**: topic -> live connections, behind one coarse lock
//! - **broadcast**: non-blocking fan-out with slow-consumer eviction
//! - **pump**: per-connection reader/writer loops with keepalive
//! - **dispatcher**: routes decoded frames to persistence and broadcast
//! - **frames**: inbound decoding and outbound notices
//! - **hub**: owns one registry per topic kind

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod frames;
pub mod hub;
pub mod pump;
pub mod registry;
pub mod session;

pub use broadcast::{Broadcaster, DeliveryReport};
pub use connection::{ConnectionHandle, ConnectionId, Payload};
pub use dispatcher::{Disposition, DurabilityPolicy};
pub use hub::RealtimeHub;
pub use pump::ConnectionPump;
pub use registry::{ConnectionRegistry, TopicRetention};
pub use session::{CloseReason, ConnectionPhase};

/// The two kinds of topics connections subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Chat,
    Call,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::Chat => "chat",
            TopicKind::Call => "call",
        }
    }
}
