//! Typed publish/subscribe channel for dispatch outcomes.
//!
//! Three event kinds: `warning` for configuration gaps, `push` for accepted
//! (or dry-run) sends, `error` for per-recipient failures.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::DeliveryError;
use crate::models::{Capability, Notification};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Warning,
    Push,
    Error,
}

/// Who a push or error event is about
#[derive(Debug, Clone)]
pub struct EventPayload {
    pub capability: Capability,
    pub token: String,
    pub notification: Arc<Notification>,
}

#[derive(Debug, Clone)]
pub enum PushEvent {
    Warning {
        message: String,
    },
    Push {
        payload: EventPayload,
    },
    Error {
        error: DeliveryError,
        payload: EventPayload,
    },
}

impl PushEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PushEvent::Warning { .. } => EventKind::Warning,
            PushEvent::Push { .. } => EventKind::Push,
            PushEvent::Error { .. } => EventKind::Error,
        }
    }

    pub fn payload(&self) -> Option<&EventPayload> {
        match self {
            PushEvent::Warning { .. } => None,
            PushEvent::Push { payload } | PushEvent::Error { payload, .. } => Some(payload),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&PushEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(SubscriptionId, EventKind, Handler)>,
}

/// Cloneable handle; clones share subscribers
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.handlers.push((id, kind, Arc::new(handler)));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.write();
        let before = registry.handlers.len();
        registry.handlers.retain(|(sid, _, _)| *sid != id);
        registry.handlers.len() != before
    }

    /// Handlers run synchronously on the caller, outside the registry lock.
    pub fn publish(&self, event: PushEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .registry
            .read()
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| h.clone())
            .collect();

        for handler in handlers {
            handler(&event);
        }
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.publish(PushEvent::Warning {
            message: message.into(),
        });
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .read()
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}
