//! Broadcast Engine
//!
//! Fans a serialized payload out to every connection subscribed to a topic.
//! Enqueueing never blocks: a connection whose queue is full or closed is
//! evicted instead of slowing down the rest of the topic.

use std::sync::Arc;

use uuid::Uuid;

use super::connection::{ConnectionHandle, EnqueueError, Payload};
use super::registry::ConnectionRegistry;
use super::TopicKind;
use crate::infrastructure::metrics;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Payloads enqueued
    pub delivered: usize,
    /// Recipients skipped because they belong to the excluded user
    pub skipped: usize,
    /// Connections closed and unsubscribed during this broadcast
    pub evicted: usize,
}

#[derive(Clone)]
pub struct Broadcaster {
    kind: TopicKind,
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(kind: TopicKind, registry: Arc<ConnectionRegistry>) -> Self {
        Self { kind, registry }
    }

    pub fn kind(&self) -> TopicKind {
        self.kind
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Deliver `payload` to every connection on `topic`.
    ///
    /// With `exclude_user` set, all connections of that user are skipped,
    /// otherwise everybody (the sender included) receives it. Connections
    /// that cannot take the payload are closed and unsubscribed.
    pub fn broadcast(&self, topic: Uuid, exclude_user: Option<Uuid>, payload: Payload) -> DeliveryReport {
        let recipients = self.registry.snapshot(topic);
        let mut report = DeliveryReport::default();
        let mut evicted = Vec::new();

        for conn in recipients {
            if exclude_user == Some(conn.user_id()) {
                report.skipped += 1;
                continue;
            }

            match conn.try_enqueue(Payload::clone(&payload)) {
                Ok(()) => report.delivered += 1,
                Err(reason) => evicted.push((conn, reason)),
            }
        }

        for (conn, reason) in evicted {
            self.evict(topic, &conn, reason);
            report.evicted += 1;
        }

        metrics::record_broadcast(self.kind.as_str(), report.delivered, report.evicted);

        tracing::trace!(
            topic_kind = self.kind.as_str(),
            topic = %topic,
            delivered = report.delivered,
            skipped = report.skipped,
            evicted = report.evicted,
            "Broadcast complete"
        );

        report
    }

    /// Deliver `payload` to a single connection, with the same eviction rule
    /// as [`Broadcaster::broadcast`].
    pub fn send_to(&self, topic: Uuid, conn: &ConnectionHandle, payload: Payload) -> bool {
        match conn.try_enqueue(payload) {
            Ok(()) => true,
            Err(reason) => {
                self.evict(topic, conn, reason);
                false
            }
        }
    }

    fn evict(&self, topic: Uuid, conn: &ConnectionHandle, reason: EnqueueError) {
        conn.close();
        self.registry.unsubscribe(topic, conn.id());

        if reason == EnqueueError::Full {
            tracing::warn!(
                topic_kind = self.kind.as_str(),
                topic = %topic,
                connection_id = %conn.id(),
                user_id = %conn.user_id(),
                "Slow consumer evicted"
            );
        } else {
            tracing::debug!(
                topic = %topic,
                connection_id = %conn.id(),
                "Dropped closed connection"
            );
        }
    }
}
