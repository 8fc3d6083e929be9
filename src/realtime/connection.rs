//! Connection handles and outbound queues.
//!
//! A connection is split in two halves. The [`ConnectionHandle`] is cheap to
//! clone and is what the registry stores and the broadcaster enqueues onto.
//! The [`OutboundQueue`] is owned by the connection's writer loop.
//!
//! Closing is signalled through a cancellation token shared by both halves,
//! so it is idempotent and observable from either side.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

/// Serialized outbound frame, shared between all recipients of a broadcast.
pub type Payload = Arc<str>;

/// Unique identifier of one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a payload could not be enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("outbound queue is full")]
    Full,

    #[error("connection is closed")]
    Closed,
}

struct HandleInner {
    id: ConnectionId,
    user_id: Uuid,
    tx: mpsc::Sender<Payload>,
    closed: CancellationToken,
    close_requested: AtomicBool,
}

/// Registry-side reference to a live connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// The authenticated user owning this connection.
    pub fn user_id(&self) -> Uuid {
        self.inner.user_id
    }

    /// Enqueue a payload without waiting for queue capacity.
    pub fn try_enqueue(&self, payload: Payload) -> Result<(), EnqueueError> {
        if self.is_closed() {
            return Err(EnqueueError::Closed);
        }

        self.inner.tx.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => EnqueueError::Full,
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Close the connection's outbound side. Pending payloads are discarded
    /// and the writer loop stops.
    ///
    /// Returns `true` only for the call that actually closed the connection.
    pub fn close(&self) -> bool {
        let first = !self.inner.close_requested.swap(true, Ordering::AcqRel);
        self.inner.closed.cancel();
        first
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Resolves once the connection has been closed from either side.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.inner.closed.cancelled()
    }

    /// Token that closes the connection without keeping its queue alive.
    pub(crate) fn close_token(&self) -> CancellationToken {
        self.inner.closed.clone()
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.inner.id)
            .field("user_id", &self.inner.user_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Writer-side half: drains payloads in FIFO order.
pub struct OutboundQueue {
    rx: mpsc::Receiver<Payload>,
    closed: CancellationToken,
}

impl OutboundQueue {
    /// Wait for the next payload.
    ///
    /// Returns `None` once the connection is closed, or once every handle has
    /// been dropped and the queue is drained.
    pub async fn next(&mut self) -> Option<Payload> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            payload = self.rx.recv() => payload,
        }
    }

    /// Close the connection from the writer side, e.g. after a failed write.
    pub fn close(&self) {
        self.closed.cancel();
    }
}

/// Create the two halves of a new connection for `user_id`.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn connection(user_id: Uuid, capacity: usize) -> (ConnectionHandle, OutboundQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    let closed = CancellationToken::new();

    let handle = ConnectionHandle {
        inner: Arc::new(HandleInner {
            id: ConnectionId::new(),
            user_id,
            tx,
            closed: closed.clone(),
            close_requested: AtomicBool::new(false),
        }),
    };

    (handle, OutboundQueue { rx, closed })
}
