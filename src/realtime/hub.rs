//! Realtime hub: one registry and broadcaster per topic kind, plus the
//! shared dispatcher. Constructed once at startup and injected wherever
//! connections are accepted or payloads are pushed.

use std::sync::Arc;

use uuid::Uuid;

use super::broadcast::Broadcaster;
use super::connection::connection;
use super::dispatcher::{Dispatcher, DurabilityPolicy};
use super::pump::{ConnectionPump, Keepalive};
use super::registry::{ConnectionRegistry, TopicRetention};
use super::TopicKind;
use crate::config::WebSocketSettings;
use crate::infrastructure::repositories::Repositories;

pub struct RealtimeHub {
    chat: Broadcaster,
    call: Broadcaster,
    dispatcher: Arc<Dispatcher>,
    settings: WebSocketSettings,
}

impl RealtimeHub {
    pub fn new(repos: Repositories, settings: WebSocketSettings) -> Self {
        let call_retention = if settings.retain_empty_call_rooms {
            TopicRetention::RetainWhenEmpty
        } else {
            TopicRetention::DropWhenEmpty
        };

        let chat = Broadcaster::new(
            TopicKind::Chat,
            Arc::new(ConnectionRegistry::new(TopicRetention::DropWhenEmpty)),
        );
        let call = Broadcaster::new(
            TopicKind::Call,
            Arc::new(ConnectionRegistry::new(call_retention)),
        );

        let dispatcher = Arc::new(Dispatcher::new(
            repos,
            chat.clone(),
            call.clone(),
            DurabilityPolicy::from_flag(settings.broadcast_on_persist_failure),
        ));

        Self {
            chat,
            call,
            dispatcher,
            settings,
        }
    }

    pub fn broadcaster(&self, kind: TopicKind) -> &Broadcaster {
        match kind {
            TopicKind::Chat => &self.chat,
            TopicKind::Call => &self.call,
        }
    }

    pub fn registry(&self, kind: TopicKind) -> &Arc<ConnectionRegistry> {
        self.broadcaster(kind).registry()
    }

    pub fn settings(&self) -> &WebSocketSettings {
        &self.settings
    }

    /// Keep a freshly created call room registered until the call ends.
    /// Does nothing unless empty call rooms are retained.
    pub fn open_call_room(&self, call_id: Uuid) {
        self.call.registry().open_topic(call_id);
    }

    /// Register a new connection for `user_id` on `topic` and return the pump
    /// that drives it.
    pub fn connect(&self, kind: TopicKind, topic: Uuid, user_id: Uuid) -> ConnectionPump {
        let (handle, queue) = connection(user_id, self.settings.outbound_queue_capacity);
        let registry = self.registry(kind).clone();
        registry.subscribe(topic, handle.clone());

        ConnectionPump::new(
            kind,
            topic,
            handle,
            queue,
            registry,
            self.dispatcher.clone(),
            Keepalive {
                ping_interval: self.settings.ping_interval(),
                idle_timeout: self.settings.idle_timeout(),
            },
        )
    }

    /// Live connections of one kind, across all topics.
    pub fn connection_count(&self, kind: TopicKind) -> usize {
        self.registry(kind).connection_count()
    }
}
