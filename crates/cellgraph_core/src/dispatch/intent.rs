//! User intents emitted by the rendering component.

use crate::model::cell::CellId;

/// One user action on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasIntent {
    /// A cell is being dragged; emitted per drag tick.
    DragMove { cell: CellId, x: f64, y: f64 },
    /// A connection was dragged out of `parent` and dropped at `(x, y)`.
    /// `parent: None` requests a new root cell.
    Connect {
        parent: Option<CellId>,
        x: f64,
        y: f64,
    },
    /// Source text changed.
    Edit { cell: CellId, source: String },
    Run { cell: CellId },
    Delete { cell: CellId },
    Save,
}
