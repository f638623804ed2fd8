//! Dispatch table keyed by message kind.

use crate::protocol::{MessageKind, ServerMessage};
use crate::reconcile::content::ContentReconciler;
use crate::reconcile::topology::TopologyReconciler;
use crate::store::GraphStore;
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One independent reconciliation concern.
pub trait EventSubscriber: Send {
    /// Stable name, unique within one router.
    fn name(&self) -> &str;

    /// Kinds this subscriber wants to receive.
    fn kinds(&self) -> &[MessageKind];

    fn handle(&mut self, message: &ServerMessage, store: &mut GraphStore);
}

/// Subscriber registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    InvalidSubscriberName(String),
    DuplicateSubscriberName(String),
}

impl Display for RouterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSubscriberName(value) => write!(f, "subscriber name is invalid: {value}"),
            Self::DuplicateSubscriberName(value) => {
                write!(f, "subscriber already registered: {value}")
            }
        }
    }
}

impl Error for RouterError {}

/// Fan-out router; any number of subscribers per kind.
#[derive(Default)]
pub struct EventRouter {
    subscribers: Vec<Box<dyn EventSubscriber>>,
    kind_index: BTreeMap<MessageKind, Vec<usize>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router preloaded with topology then content reconcilers.
    pub fn with_default_subscribers() -> Self {
        let mut router = Self::new();
        router.subscribers.push(Box::new(TopologyReconciler));
        router.subscribers.push(Box::new(ContentReconciler));
        router.rebuild_index();
        router
    }

    /// Registers one subscriber after validating its name.
    pub fn register(&mut self, subscriber: Box<dyn EventSubscriber>) -> Result<(), RouterError> {
        let name = subscriber.name().trim().to_string();
        if name.is_empty() {
            return Err(RouterError::InvalidSubscriberName(name));
        }
        if self.subscribers.iter().any(|existing| existing.name() == name) {
            return Err(RouterError::DuplicateSubscriberName(name));
        }

        let slot = self.subscribers.len();
        for kind in subscriber.kinds() {
            self.kind_index.entry(*kind).or_default().push(slot);
        }
        self.subscribers.push(subscriber);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Subscriber names in registration order.
    pub fn subscriber_names(&self) -> Vec<&str> {
        self.subscribers.iter().map(|s| s.name()).collect()
    }

    /// Names of subscribers registered for `kind`.
    pub fn subscribers_for(&self, kind: MessageKind) -> Vec<&str> {
        let Some(slots) = self.kind_index.get(&kind) else {
            return vec![];
        };
        slots
            .iter()
            .map(|slot| self.subscribers[*slot].name())
            .collect()
    }

    /// Delivers `message` to each matching subscriber; returns how many ran.
    pub fn dispatch(&mut self, message: &ServerMessage, store: &mut GraphStore) -> usize {
        let kind = message.kind();
        let Some(slots) = self.kind_index.get(&kind) else {
            debug!(
                "event=router_dispatch module=reconcile status=skip kind={}",
                kind.as_str()
            );
            return 0;
        };
        for slot in slots {
            self.subscribers[*slot].handle(message, store);
        }
        slots.len()
    }

    fn rebuild_index(&mut self) {
        self.kind_index.clear();
        for (slot, subscriber) in self.subscribers.iter().enumerate() {
            for kind in subscriber.kinds() {
                self.kind_index.entry(*kind).or_default().push(slot);
            }
        }
    }
}
