//! Connection session state

use std::fmt;

use tokio::time::{Duration, Instant};

/// Lifecycle of one connection: `Connecting -> Active -> Closing -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connecting,
    Active,
    Closing,
    Closed,
}

/// Why a connection left the `Active` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer sent a close frame or the stream ended
    ClientClosed,
    /// Reading from or writing to the transport failed
    TransportError,
    /// The outbound side was closed: evicted as a slow consumer, or the
    /// writer failed
    Cancelled,
    /// No inbound traffic within the idle timeout
    IdleTimeout,
    /// The call this connection belonged to was ended
    CallEnded,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::ClientClosed => "client_closed",
            CloseReason::TransportError => "transport_error",
            CloseReason::Cancelled => "cancelled",
            CloseReason::IdleTimeout => "idle_timeout",
            CloseReason::CallEnded => "call_ended",
        }
    }

    /// Whether frames already queued should still be flushed to the peer.
    pub fn drains_queue(&self) -> bool {
        matches!(self, CloseReason::ClientClosed | CloseReason::CallEnded)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-connection session state owned by the reader loop.
#[derive(Debug)]
pub struct SessionState {
    phase: ConnectionPhase,
    close_reason: Option<CloseReason>,
    last_activity: Instant,
    frames_received: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: ConnectionPhase::Connecting,
            close_reason: None,
            last_activity: Instant::now(),
            frames_received: 0,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Handshake done and the connection is registered.
    pub fn activate(&mut self) {
        if self.phase == ConnectionPhase::Connecting {
            self.phase = ConnectionPhase::Active;
            self.last_activity = Instant::now();
        }
    }

    /// Enter `Closing`. Only the first reason is kept; returns `false` if the
    /// session was already closing or closed.
    pub fn begin_closing(&mut self, reason: CloseReason) -> bool {
        match self.phase {
            ConnectionPhase::Closing | ConnectionPhase::Closed => false,
            _ => {
                self.phase = ConnectionPhase::Closing;
                self.close_reason = Some(reason);
                true
            }
        }
    }

    /// Terminal transition.
    pub fn finish(&mut self) {
        self.phase = ConnectionPhase::Closed;
    }

    /// Record inbound traffic of any kind, pongs included.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Record a data frame.
    pub fn frame_received(&mut self) {
        self.frames_received += 1;
        self.touch();
    }

    pub fn is_alive(&self, idle_timeout: Duration) -> bool {
        self.last_activity.elapsed() < idle_timeout
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
