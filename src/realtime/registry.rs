//! Connection Registry
//!
//! Maps topic ids (chat ids, call ids) to the set of live connections
//! subscribed to them. A single coarse lock guards the whole map; broadcasts
//! only hold it long enough to clone a snapshot of the recipients.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use super::connection::{ConnectionHandle, ConnectionId};

/// What happens to a topic entry once its last connection leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicRetention {
    /// Remove the entry as soon as it is empty.
    DropWhenEmpty,
    /// Keep entries created through [`ConnectionRegistry::open_topic`] until
    /// they are retired explicitly.
    RetainWhenEmpty,
}

#[derive(Default)]
struct TopicEntry {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    retained: bool,
}

impl TopicEntry {
    fn is_disposable(&self) -> bool {
        self.connections.is_empty() && !self.retained
    }
}

/// Thread-safe topic -> connections map.
pub struct ConnectionRegistry {
    retention: TopicRetention,
    topics: RwLock<HashMap<Uuid, TopicEntry>>,
}

impl ConnectionRegistry {
    pub fn new(retention: TopicRetention) -> Self {
        Self {
            retention,
            topics: RwLock::new(HashMap::new()),
        }
    }

    pub fn retention(&self) -> TopicRetention {
        self.retention
    }

    /// Add a connection to a topic, creating the topic if needed.
    ///
    /// Subscribing the same connection twice keeps a single entry. Returns
    /// `false` when the connection was already subscribed.
    pub fn subscribe(&self, topic: Uuid, handle: ConnectionHandle) -> bool {
        let mut topics = self.topics.write();
        let entry = topics.entry(topic).or_default();
        let id = handle.id();
        if entry.connections.contains_key(&id) {
            return false;
        }
        entry.connections.insert(id, handle);

        tracing::debug!(
            topic = %topic,
            connection_id = %id,
            subscribers = entry.connections.len(),
            "Connection subscribed"
        );
        true
    }

    /// Remove a connection from a topic. Removing an absent connection or
    /// topic is a no-op.
    pub fn unsubscribe(&self, topic: Uuid, connection: ConnectionId) -> bool {
        let mut topics = self.topics.write();
        let Some(entry) = topics.get_mut(&topic) else {
            return false;
        };

        let removed = entry.connections.remove(&connection).is_some();
        if entry.is_disposable() {
            topics.remove(&topic);
        }

        if removed {
            tracing::debug!(topic = %topic, connection_id = %connection, "Connection unsubscribed");
        }
        removed
    }

    /// Point-in-time copy of the connections subscribed to `topic`.
    ///
    /// Unknown topics yield an empty snapshot.
    pub fn snapshot(&self, topic: Uuid) -> Vec<ConnectionHandle> {
        self.topics
            .read()
            .get(&topic)
            .map(|entry| entry.connections.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Pre-create a topic that survives while empty.
    ///
    /// Only meaningful for registries configured with
    /// [`TopicRetention::RetainWhenEmpty`]; otherwise it does nothing.
    pub fn open_topic(&self, topic: Uuid) {
        if self.retention != TopicRetention::RetainWhenEmpty {
            return;
        }
        self.topics.write().entry(topic).or_default().retained = true;
        tracing::debug!(topic = %topic, "Topic opened");
    }

    /// Stop retaining a topic. It is dropped now if empty, or when its last
    /// connection leaves.
    pub fn retire_topic(&self, topic: Uuid) {
        let mut topics = self.topics.write();
        if let Some(entry) = topics.get_mut(&topic) {
            entry.retained = false;
            if entry.is_disposable() {
                topics.remove(&topic);
            }
        }
    }

    pub fn contains_topic(&self, topic: Uuid) -> bool {
        self.topics.read().contains_key(&topic)
    }

    pub fn is_subscribed(&self, topic: Uuid, connection: ConnectionId) -> bool {
        self.topics
            .read()
            .get(&topic)
            .is_some_and(|entry| entry.connections.contains_key(&connection))
    }

    /// Number of connections subscribed to `topic`.
    pub fn subscriber_count(&self, topic: Uuid) -> usize {
        self.topics
            .read()
            .get(&topic)
            .map_or(0, |entry| entry.connections.len())
    }

    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }

    /// Number of live connections across all topics.
    pub fn connection_count(&self) -> usize {
        self.topics
            .read()
            .values()
            .map(|entry| entry.connections.len())
            .sum()
    }
}
