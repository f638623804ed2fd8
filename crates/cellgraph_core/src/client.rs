//! Notebook client facade.
//!
//! # Responsibility
//! - Own one transport, one graph store, and one reconciler.
//! - Expose user commands and an explicit `pump()` that applies inbound
//!   events to the store.
//!
//! # Invariants
//! - Topology only changes through server confirmations applied by `pump()`.
//! - Local echoes (drag position, running flag, cleared outputs) only happen
//!   when the matching request was handed to an open connection.
//! - Nothing here blocks except `wait_for_hydration`.
//! - A command that finds the connection gone moves the sync lifecycle to
//!   `Disconnected` before it returns.

use crate::config::{ClientConfig, OutputPolicy};
use crate::dispatch::{CanvasIntent, CommandDispatcher};
use crate::model::cell::{CellId, Position};
use crate::reconcile::{EventSubscriber, Reconciler, RouterError, SyncState};
use crate::store::{GraphSnapshot, GraphStore};
use crate::transport::{
    ConnectionState, Connector, TransportAdapter, TransportResult, WsConnector,
};
use log::{debug, info};
use std::time::{Duration, Instant};

/// Client session over one connector.
pub struct NotebookClient<C: Connector> {
    transport: TransportAdapter<C>,
    store: GraphStore,
    reconciler: Reconciler,
    output_policy: OutputPolicy,
}

impl NotebookClient<WsConnector> {
    /// Builds a WebSocket client from validated config. Does not connect.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(WsConnector::new(config.server_url.clone()), config.output_policy)
    }
}

impl<C: Connector> NotebookClient<C> {
    pub fn new(connector: C, output_policy: OutputPolicy) -> Self {
        Self {
            transport: TransportAdapter::new(connector),
            store: GraphStore::new(),
            reconciler: Reconciler::new(),
            output_policy,
        }
    }

    /// Opens the connection; a no-op when already connected.
    ///
    /// # Errors
    /// - Returns the transport error when the connection cannot be opened.
    pub fn connect(&mut self) -> TransportResult<bool> {
        let opened = self.transport.connect()?;
        if opened {
            self.reconciler.connected();
        }
        Ok(opened)
    }

    pub fn disconnect(&mut self) {
        self.transport.disconnect();
        self.reconciler.disconnected();
    }

    /// Applies every pending server event. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let outcome = self.transport.poll();
        for message in &outcome.messages {
            self.reconciler.apply(message, &mut self.store);
        }
        if outcome.disconnected {
            self.reconciler.disconnected();
        }
        if !outcome.messages.is_empty() || outcome.skipped > 0 {
            debug!(
                "event=client_pump module=client status=ok applied={} skipped={} revision={}",
                outcome.messages.len(),
                outcome.skipped,
                self.store.revision()
            );
        }
        outcome.messages.len()
    }

    /// Pumps until the first snapshot lands, the connection drops, or
    /// `timeout` elapses. Returns whether the client is hydrated.
    pub fn wait_for_hydration(&mut self, timeout: Duration, interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            match self.reconciler.state() {
                SyncState::Hydrated => return true,
                SyncState::Disconnected => return false,
                SyncState::AwaitingHydration => {}
            }
            if Instant::now() >= deadline {
                info!("event=client_hydrate module=client status=error reason=timeout");
                return false;
            }
            std::thread::sleep(interval);
        }
    }

    pub fn sync_state(&self) -> SyncState {
        self.reconciler.state()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn output_policy(&self) -> OutputPolicy {
        self.output_policy
    }

    /// Endpoint this client dials.
    pub fn endpoint(&self) -> String {
        self.transport.connector().endpoint()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.store.snapshot()
    }

    /// Registers an extra event subscriber after the built-in ones.
    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) -> Result<(), RouterError> {
        self.reconciler.subscribe(subscriber)
    }

    /// Requests a new cell; it appears once the server confirms it.
    pub fn create_cell(&mut self, parent: Option<CellId>) -> CellId {
        self.dispatch(|dispatcher| dispatcher.create_cell(parent))
    }

    pub fn delete_cell(&mut self, cell: CellId) -> bool {
        self.dispatch(|dispatcher| dispatcher.delete_cell(cell))
    }

    pub fn update_cell(&mut self, cell: CellId, source: impl Into<String>) -> bool {
        self.dispatch(|dispatcher| dispatcher.update_cell(cell, source))
    }

    /// Requests a run and marks the cell running until `DidRunCell`.
    pub fn run_cell(&mut self, cell: CellId) -> bool {
        if !self.dispatch(|dispatcher| dispatcher.run_cell(cell.clone())) {
            return false;
        }
        if self.output_policy == OutputPolicy::ClearOnRun {
            self.store.clear_outputs(&cell);
        }
        self.store.update_cell(&cell, |entry| entry.running = true);
        true
    }

    /// Sends a drag tick and echoes the position locally.
    pub fn move_cell(&mut self, cell: CellId, x: f64, y: f64) -> bool {
        if !self.dispatch(|dispatcher| dispatcher.move_cell(cell.clone(), x, y)) {
            return false;
        }
        self.store.set_position(&cell, Position::new(x, y));
        true
    }

    pub fn save_notebook(&mut self) -> bool {
        self.dispatch(|dispatcher| dispatcher.save_notebook())
    }

    /// Local-only output reset.
    pub fn clear_outputs(&mut self, cell: &CellId) -> bool {
        self.store.clear_outputs(cell)
    }

    /// Routes one renderer intent. Returns the minted id for creates.
    pub fn handle_intent(&mut self, intent: CanvasIntent) -> Option<CellId> {
        match intent {
            CanvasIntent::DragMove { cell, x, y } => {
                self.move_cell(cell, x, y);
                None
            }
            CanvasIntent::Run { cell } => {
                self.run_cell(cell);
                None
            }
            other => self.dispatch(|dispatcher| dispatcher.handle_intent(other)),
        }
    }

    fn dispatch<R>(
        &mut self,
        f: impl FnOnce(&mut CommandDispatcher<&mut TransportAdapter<C>>) -> R,
    ) -> R {
        let result = f(&mut CommandDispatcher::new(&mut self.transport));
        if !self.transport.is_connected() {
            self.reconciler.disconnected();
        }
        result
    }
}
