//! Derived parent→child edges.
//!
//! # Invariants
//! - Edge ids are a pure function of `(source, target)`, so repeated creates
//!   and deletes of the same relationship address the same entry.

use crate::model::cell::CellId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Deterministic edge identifier: `"{source}_{target}"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn derive(source: &CellId, target: &CellId) -> Self {
        Self(format!("{source}_{target}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parent→child relationship rendered on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: CellId,
    pub target: CellId,
}

impl Edge {
    pub fn between(source: CellId, target: CellId) -> Self {
        Self {
            id: EdgeId::derive(&source, &target),
            source,
            target,
        }
    }

    /// Returns whether either endpoint is `cell`.
    pub fn touches(&self, cell: &CellId) -> bool {
        &self.source == cell || &self.target == cell
    }
}
