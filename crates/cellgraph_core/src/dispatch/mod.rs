//! Outbound command dispatch.
//!
//! # Responsibility
//! - Translate user intents into protocol messages.
//! - Mint cell ids client-side for create commands.
//!
//! # Invariants
//! - The dispatcher never mutates graph state; topology changes only arrive
//!   as server confirmations.
//! - Every call sends exactly one message; there is no batching or debouncing.

use crate::model::cell::CellId;
use crate::protocol::{ClientMessage, CreateCell, DeleteCell, MoveCell, RunCell, UpdateCell};
use log::debug;

pub mod intent;

pub use intent::CanvasIntent;

/// Destination for outbound messages.
pub trait MessageSink {
    /// Returns whether the message was handed to an open connection.
    fn send(&mut self, message: &ClientMessage) -> bool;
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn send(&mut self, message: &ClientMessage) -> bool {
        (**self).send(message)
    }
}

/// Records messages instead of sending them.
impl MessageSink for Vec<ClientMessage> {
    fn send(&mut self, message: &ClientMessage) -> bool {
        self.push(message.clone());
        true
    }
}

/// Intent-to-message translator over one sink.
pub struct CommandDispatcher<S: MessageSink> {
    sink: S,
}

impl<S: MessageSink> CommandDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Requests a new cell and returns its client-minted id.
    ///
    /// The cell appears locally only when `DidCreateCell` comes back.
    pub fn create_cell(&mut self, parent: Option<CellId>) -> CellId {
        let cell = CellId::mint();
        debug!(
            "event=dispatch_create module=dispatch cell={} has_parent={}",
            cell,
            parent.is_some()
        );
        self.sink.send(&ClientMessage::CreateCell(CreateCell {
            cell: cell.clone(),
            parent,
        }));
        cell
    }

    pub fn delete_cell(&mut self, cell: CellId) -> bool {
        self.sink
            .send(&ClientMessage::DeleteCell(DeleteCell { cell }))
    }

    pub fn update_cell(&mut self, cell: CellId, source: impl Into<String>) -> bool {
        self.sink.send(&ClientMessage::UpdateCell(UpdateCell {
            cell,
            source: source.into(),
        }))
    }

    pub fn run_cell(&mut self, cell: CellId) -> bool {
        self.sink.send(&ClientMessage::RunCell(RunCell { cell }))
    }

    pub fn save_notebook(&mut self) -> bool {
        self.sink.send(&ClientMessage::SaveNotebook)
    }

    /// Sends one drag tick. Fire-and-forget.
    pub fn move_cell(&mut self, cell: CellId, x: f64, y: f64) -> bool {
        self.sink
            .send(&ClientMessage::MoveCell(MoveCell { cell, x, y }))
    }

    /// Routes one renderer intent. Returns the minted id for creates.
    pub fn handle_intent(&mut self, intent: CanvasIntent) -> Option<CellId> {
        match intent {
            CanvasIntent::DragMove { cell, x, y } => {
                self.move_cell(cell, x, y);
                None
            }
            CanvasIntent::Connect { parent, .. } => Some(self.create_cell(parent)),
            CanvasIntent::Edit { cell, source } => {
                self.update_cell(cell, source);
                None
            }
            CanvasIntent::Run { cell } => {
                self.run_cell(cell);
                None
            }
            CanvasIntent::Delete { cell } => {
                self.delete_cell(cell);
                None
            }
            CanvasIntent::Save => {
                self.save_notebook();
                None
            }
        }
    }
}
