//! Inbound event reconciliation.
//!
//! # Responsibility
//! - Track the sync lifecycle (`Disconnected → AwaitingHydration → Hydrated`).
//! - Route each decoded server event to every subscriber registered for its
//!   kind, in registration order.
//!
//! # Invariants
//! - Events are applied synchronously, one at a time, in delivery order.
//! - Unknown kinds and lookup misses degrade to no-ops; nothing here fails.

use crate::protocol::{MessageKind, ServerMessage};
use crate::store::GraphStore;
use log::{debug, info};

pub mod content;
pub mod router;
pub mod topology;

pub use content::ContentReconciler;
pub use router::{EventRouter, EventSubscriber, RouterError};
pub use topology::TopologyReconciler;

/// Sync lifecycle seen from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Disconnected,
    /// Connected; the first `Notebook` snapshot has not arrived yet.
    AwaitingHydration,
    Hydrated,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::AwaitingHydration => "awaiting_hydration",
            Self::Hydrated => "hydrated",
        }
    }
}

/// Lifecycle tracker plus event router.
pub struct Reconciler {
    router: EventRouter,
    state: SyncState,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    /// Creates a reconciler with the topology and content subscribers.
    pub fn new() -> Self {
        Self::with_router(EventRouter::with_default_subscribers())
    }

    pub fn with_router(router: EventRouter) -> Self {
        Self {
            router,
            state: SyncState::Disconnected,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Registers an additional subscriber.
    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) -> Result<(), RouterError> {
        self.router.register(subscriber)
    }

    /// Transport reported a fresh connection.
    pub fn connected(&mut self) {
        self.transition(SyncState::AwaitingHydration);
    }

    /// Transport reported the connection is gone.
    pub fn disconnected(&mut self) {
        self.transition(SyncState::Disconnected);
    }

    /// Applies one server event to `store`.
    ///
    /// Returns the number of subscribers that handled it.
    pub fn apply(&mut self, message: &ServerMessage, store: &mut GraphStore) -> usize {
        let kind = message.kind();
        if self.state != SyncState::Hydrated && kind != MessageKind::Notebook {
            debug!(
                "event=reconcile_apply module=reconcile status=early kind={} state={}",
                kind.as_str(),
                self.state.as_str()
            );
        }

        let handled = self.router.dispatch(message, store);
        if kind == MessageKind::Notebook {
            self.transition(SyncState::Hydrated);
        }
        handled
    }

    fn transition(&mut self, next: SyncState) {
        if self.state == next {
            return;
        }
        info!(
            "event=sync_state module=reconcile status=ok from={} to={}",
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::{Reconciler, SyncState};
    use crate::model::cell::CellId;
    use crate::protocol::{NotebookSnapshot, ServerMessage};
    use crate::store::GraphStore;

    #[test]
    fn first_snapshot_completes_hydration() {
        let mut reconciler = Reconciler::new();
        let mut store = GraphStore::new();
        assert_eq!(reconciler.state(), SyncState::Disconnected);

        reconciler.connected();
        assert_eq!(reconciler.state(), SyncState::AwaitingHydration);

        reconciler.apply(
            &ServerMessage::Stdout {
                cell: CellId::from("a"),
                text: "early".to_string(),
            },
            &mut store,
        );
        assert_eq!(reconciler.state(), SyncState::AwaitingHydration);

        reconciler.apply(
            &ServerMessage::Notebook(NotebookSnapshot::default()),
            &mut store,
        );
        assert_eq!(reconciler.state(), SyncState::Hydrated);

        reconciler.disconnected();
        assert_eq!(reconciler.state(), SyncState::Disconnected);
    }

    #[test]
    fn unknown_messages_reach_no_subscriber() {
        let mut reconciler = Reconciler::new();
        let mut store = GraphStore::new();
        let handled = reconciler.apply(&ServerMessage::Unknown, &mut store);
        assert_eq!(handled, 0);
        assert_eq!(store.revision(), 0);
    }
}
