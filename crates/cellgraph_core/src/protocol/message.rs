//! Message shapes.

use crate::model::cell::{Cell, CellId};
use serde::{Deserialize, Serialize};

/// Request to create a cell under an optional parent.
///
/// `cell` is minted by the client; the server echoes the request back in
/// `DidCreateCell` once it accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCell {
    pub cell: CellId,
    pub parent: Option<CellId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCell {
    pub cell: CellId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCell {
    pub cell: CellId,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCell {
    pub cell: CellId,
}

/// Raw drag coordinate for one cell. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCell {
    pub cell: CellId,
    pub x: f64,
    pub y: f64,
}

/// Outbound messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum ClientMessage {
    SaveNotebook,
    CreateCell(CreateCell),
    DeleteCell(DeleteCell),
    UpdateCell(UpdateCell),
    RunCell(RunCell),
    MoveCell(MoveCell),
}

impl ClientMessage {
    /// Discriminant string, as written on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SaveNotebook => "SaveNotebook",
            Self::CreateCell(_) => "CreateCell",
            Self::DeleteCell(_) => "DeleteCell",
            Self::UpdateCell(_) => "UpdateCell",
            Self::RunCell(_) => "RunCell",
            Self::MoveCell(_) => "MoveCell",
        }
    }

    /// Cell addressed by this message, if any.
    pub fn cell(&self) -> Option<&CellId> {
        match self {
            Self::SaveNotebook => None,
            Self::CreateCell(request) => Some(&request.cell),
            Self::DeleteCell(request) => Some(&request.cell),
            Self::UpdateCell(request) => Some(&request.cell),
            Self::RunCell(request) => Some(&request.cell),
            Self::MoveCell(request) => Some(&request.cell),
        }
    }
}

/// Full notebook state sent by the server on connect.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotebookSnapshot {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

/// Inbound messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum ServerMessage {
    Notebook(NotebookSnapshot),
    DidCreateCell { request: CreateCell },
    DidDeleteCell { request: DeleteCell },
    DidUpdateCell { request: UpdateCell },
    DidRunCell { request: RunCell },
    Stdout { cell: CellId, text: String },
    /// Any discriminant this client does not know.
    #[serde(other)]
    Unknown,
}

/// Dispatch key for inbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    Notebook,
    DidCreateCell,
    DidDeleteCell,
    DidUpdateCell,
    DidRunCell,
    Stdout,
    Unknown,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notebook => "Notebook",
            Self::DidCreateCell => "DidCreateCell",
            Self::DidDeleteCell => "DidDeleteCell",
            Self::DidUpdateCell => "DidUpdateCell",
            Self::DidRunCell => "DidRunCell",
            Self::Stdout => "Stdout",
            Self::Unknown => "Unknown",
        }
    }
}

impl ServerMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Notebook(_) => MessageKind::Notebook,
            Self::DidCreateCell { .. } => MessageKind::DidCreateCell,
            Self::DidDeleteCell { .. } => MessageKind::DidDeleteCell,
            Self::DidUpdateCell { .. } => MessageKind::DidUpdateCell,
            Self::DidRunCell { .. } => MessageKind::DidRunCell,
            Self::Stdout { .. } => MessageKind::Stdout,
            Self::Unknown => MessageKind::Unknown,
        }
    }
}
