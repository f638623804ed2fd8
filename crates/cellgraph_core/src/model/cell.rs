//! Cell domain model.
//!
//! # Responsibility
//! - Define the canonical node record shared by hydration and confirmations.
//! - Provide the client-side identifier minting used for optimistic creates.
//!
//! # Invariants
//! - `id` is stable and never reused for another cell.
//! - `parent` is fixed at creation time.
//! - `outputs` only grows during a run; it shrinks only through an explicit clear.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque, globally unique cell identifier.
///
/// Serialized as a bare string so ids minted by other clients (or by the
/// server) round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    /// Wraps an existing identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints a fresh client-side identifier (UUID v4).
    ///
    /// Used by create commands before the server has seen the cell.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CellId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CellId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Canvas coordinate of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One output record produced by running a cell.
///
/// Serialized as `{"type": "text", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellOutput {
    /// Captured standard output text.
    Text { data: String },
}

impl CellOutput {
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text { data: data.into() }
    }

    /// Byte length of the payload, used by metadata-only log events.
    pub fn len(&self) -> usize {
        match self {
            Self::Text { data } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Notebook cell as mirrored on the client.
///
/// The same shape is used for server snapshot entries. Snapshot fields other
/// than `id` and `parent` are optional on the wire and default to blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Stable identifier.
    pub id: CellId,
    /// Spawning cell. `None` means a root cell.
    #[serde(default)]
    pub parent: Option<CellId>,
    /// Editable source text.
    #[serde(default)]
    pub source: String,
    /// Ordered output records.
    #[serde(default)]
    pub outputs: Vec<CellOutput>,
    /// Canvas position, last write wins.
    #[serde(default)]
    pub position: Position,
    /// Set while a dispatched run has not been confirmed. Client-only.
    #[serde(skip)]
    pub running: bool,
}

impl Cell {
    /// Creates a blank cell with no source, outputs, or position.
    pub fn new(id: CellId, parent: Option<CellId>) -> Self {
        Self {
            id,
            parent,
            source: String::new(),
            outputs: Vec::new(),
            position: Position::default(),
            running: false,
        }
    }

    /// Returns whether this cell has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Concatenates all text outputs.
    pub fn output_text(&self) -> String {
        self.outputs
            .iter()
            .map(|output| match output {
                CellOutput::Text { data } => data.as_str(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, CellId, CellOutput};

    #[test]
    fn minted_ids_are_unique_uuid_strings() {
        let first = CellId::mint();
        let second = CellId::mint();
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 36);
        assert!(uuid::Uuid::parse_str(first.as_str()).is_ok());
    }

    #[test]
    fn snapshot_entry_without_content_defaults_to_blank() {
        let cell: Cell = serde_json::from_str(r#"{"id":"a","parent":null}"#)
            .expect("minimal snapshot entry should parse");
        assert_eq!(cell, Cell::new(CellId::from("a"), None));
        assert!(cell.is_root());
    }

    #[test]
    fn output_text_concatenates_in_order() {
        let mut cell = Cell::new(CellId::from("a"), None);
        cell.outputs.push(CellOutput::text("1\n"));
        cell.outputs.push(CellOutput::text("2\n"));
        assert_eq!(cell.output_text(), "1\n2\n");
    }

    #[test]
    fn output_serializes_with_type_tag() {
        let value = serde_json::to_value(CellOutput::text("hi")).expect("serialize output");
        assert_eq!(value, serde_json::json!({"type": "text", "data": "hi"}));
    }

    #[test]
    fn running_flag_never_reaches_the_wire() {
        let mut cell = Cell::new(CellId::from("a"), None);
        cell.running = true;
        let value = serde_json::to_value(&cell).expect("serialize cell");
        assert!(value.get("running").is_none());
    }
}
