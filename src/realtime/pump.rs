//! Connection Pump
//!
//! Drives one live connection with two loops. The writer is spawned and
//! drains the outbound queue onto the transport, sending keepalive pings
//! in between. The reader runs on the calling task, decodes inbound frames
//! and hands them to the dispatcher one at a time.
//!
//! Either loop can end the connection: the writer by closing the queue on a
//! failed write, the reader by returning a [`CloseReason`]. Teardown always
//! unsubscribes first, so no new payloads arrive while the writer finishes.

use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use uuid::Uuid;

use super::connection::{ConnectionHandle, OutboundQueue};
use super::dispatcher::{Dispatcher, Disposition};
use super::registry::ConnectionRegistry;
use super::session::{CloseReason, SessionState};
use super::TopicKind;
use crate::infrastructure::metrics;

/// Upper bound on flushing queued frames after a graceful close.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Keepalive timing for one connection.
#[derive(Debug, Clone, Copy)]
pub struct Keepalive {
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
}

/// A registered connection, ready to be driven over a transport.
pub struct ConnectionPump {
    kind: TopicKind,
    topic: Uuid,
    handle: ConnectionHandle,
    queue: OutboundQueue,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
    keepalive: Keepalive,
    session: SessionState,
}

impl ConnectionPump {
    pub(crate) fn new(
        kind: TopicKind,
        topic: Uuid,
        handle: ConnectionHandle,
        queue: OutboundQueue,
        registry: Arc<ConnectionRegistry>,
        dispatcher: Arc<Dispatcher>,
        keepalive: Keepalive,
    ) -> Self {
        let mut session = SessionState::new();
        session.activate();

        Self {
            kind,
            topic,
            handle,
            queue,
            registry,
            dispatcher,
            keepalive,
            session,
        }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Run both loops until the connection ends, then tear it down.
    pub async fn run<W, R, E>(self, sink: W, stream: R) -> CloseReason
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: fmt::Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: fmt::Display,
    {
        let Self {
            kind,
            topic,
            handle,
            queue,
            registry,
            dispatcher,
            keepalive,
            mut session,
        } = self;

        metrics::connection_opened(kind.as_str());
        tracing::info!(
            topic_kind = kind.as_str(),
            topic = %topic,
            user_id = %handle.user_id(),
            connection_id = %handle.id(),
            "Connection active"
        );

        let mut writer = tokio::spawn(write_loop(sink, queue, keepalive.ping_interval));

        let reason = read_loop(
            &mut session,
            stream,
            &handle,
            kind,
            topic,
            &dispatcher,
            keepalive,
        )
        .await;
        session.begin_closing(reason);

        registry.unsubscribe(topic, handle.id());
        let user_id = handle.user_id();
        let connection_id = handle.id();
        let close = handle.close_token();
        drop(handle);

        let writer_result = if reason.drains_queue() {
            match time::timeout(DRAIN_TIMEOUT, &mut writer).await {
                Ok(result) => result,
                Err(_) => {
                    close.cancel();
                    writer.await
                }
            }
        } else {
            close.cancel();
            writer.await
        };
        if let Err(e) = writer_result {
            tracing::error!(connection_id = %connection_id, error = %e, "Writer task failed");
        }

        session.finish();
        metrics::connection_closed(kind.as_str());
        tracing::info!(
            topic_kind = kind.as_str(),
            topic = %topic,
            user_id = %user_id,
            connection_id = %connection_id,
            reason = %reason,
            frames = session.frames_received(),
            "Connection closed"
        );

        reason
    }
}

async fn read_loop<R, E>(
    session: &mut SessionState,
    mut stream: R,
    handle: &ConnectionHandle,
    kind: TopicKind,
    topic: Uuid,
    dispatcher: &Dispatcher,
    keepalive: Keepalive,
) -> CloseReason
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let period = keepalive.ping_interval;
    let mut liveness = time::interval_at(Instant::now() + period, period);
    liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = handle.closed() => return CloseReason::Cancelled,

            _ = liveness.tick() => {
                if !session.is_alive(keepalive.idle_timeout) {
                    return CloseReason::IdleTimeout;
                }
            }

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    session.frame_received();
                    let disposition = dispatcher.dispatch(kind, topic, handle, text.as_str()).await;
                    if disposition == Disposition::Close {
                        return CloseReason::CallEnded;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    session.touch();
                    tracing::debug!(connection_id = %handle.id(), "Dropped binary frame");
                }
                // Pings are answered by the transport itself.
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => session.touch(),
                Some(Ok(Message::Close(_))) | None => return CloseReason::ClientClosed,
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %handle.id(), error = %e, "Read failed");
                    return CloseReason::TransportError;
                }
            },
        }
    }
}

async fn write_loop<W>(mut sink: W, mut queue: OutboundQueue, ping_interval: Duration)
where
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    let mut ping = time::interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let frame = tokio::select! {
            payload = queue.next() => match payload {
                Some(payload) => Message::Text(payload.to_string().into()),
                None => break,
            },
            _ = ping.tick() => Message::Ping(Bytes::new()),
        };

        if let Err(e) = sink.send(frame).await {
            tracing::debug!(error = %e, "Write failed");
            queue.close();
            return;
        }
    }

    // Best effort; the peer may already be gone.
    let _ = sink.send(Message::Close(None)).await;
    let _ = sink.close().await;
}
