//! Content reconciliation: output streaming and confirmed edits/runs.

use crate::model::cell::{CellId, CellOutput};
use crate::protocol::{MessageKind, ServerMessage};
use crate::reconcile::router::EventSubscriber;
use crate::store::GraphStore;
use log::debug;

const CONTENT_KINDS: &[MessageKind] = &[
    MessageKind::Stdout,
    MessageKind::DidUpdateCell,
    MessageKind::DidRunCell,
];

/// Applies per-cell content changes. Never touches topology.
pub struct ContentReconciler;

impl EventSubscriber for ContentReconciler {
    fn name(&self) -> &str {
        "content"
    }

    fn kinds(&self) -> &[MessageKind] {
        CONTENT_KINDS
    }

    fn handle(&mut self, message: &ServerMessage, store: &mut GraphStore) {
        match message {
            ServerMessage::Stdout { cell, text } => append_stdout(store, cell, text),
            ServerMessage::DidUpdateCell { request } => {
                let applied = store.update_cell(&request.cell, |cell| {
                    cell.source.clone_from(&request.source);
                });
                log_miss("confirm_update", &request.cell, applied);
            }
            ServerMessage::DidRunCell { request } => {
                let applied = store.update_cell(&request.cell, |cell| cell.running = false);
                log_miss("confirm_run", &request.cell, applied);
            }
            _ => {}
        }
    }
}

/// Appends one text record; unknown cells are ignored.
pub fn append_stdout(store: &mut GraphStore, cell: &CellId, text: &str) {
    let applied = store.set_outputs(cell, |mut outputs| {
        outputs.push(CellOutput::text(text));
        outputs
    });
    if applied {
        debug!(
            "event=stdout module=reconcile status=ok cell={cell} bytes={}",
            text.len()
        );
    } else {
        log_miss("stdout", cell, applied);
    }
}

fn log_miss(event: &str, cell: &CellId, applied: bool) {
    if !applied {
        debug!("event={event} module=reconcile status=skip reason=unknown_cell cell={cell}");
    }
}
