//! Functional-update node/edge store.

use crate::model::cell::{Cell, CellId, CellOutput, Position};
use crate::model::edge::{Edge, EdgeId};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Cells in first-seen order.
pub type NodeList = IndexMap<CellId, Arc<Cell>>;
/// Edges in first-seen order.
pub type EdgeList = IndexMap<EdgeId, Arc<Edge>>;

/// Owned graph container. Inject by `&mut`; there is no global instance.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: NodeList,
    edges: EdgeList,
    revision: u64,
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<Arc<Cell>>,
    pub edges: Vec<Arc<Edge>>,
    pub revision: u64,
}

impl GraphSnapshot {
    pub fn node(&self, id: &CellId) -> Option<&Arc<Cell>> {
        self.nodes.iter().find(|cell| &cell.id == id)
    }
}

/// Differences between the stored edges and the parent-link projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeInvariantReport {
    /// Stored edges with no matching parent link.
    pub orphaned: Vec<EdgeId>,
    /// Parent links with no stored edge.
    pub missing: Vec<EdgeId>,
}

impl EdgeInvariantReport {
    pub fn is_consistent(&self) -> bool {
        self.orphaned.is_empty() && self.missing.is_empty()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the node collection with `updater(current)`.
    pub fn set_nodes<F>(&mut self, updater: F)
    where
        F: FnOnce(NodeList) -> NodeList,
    {
        let current = std::mem::take(&mut self.nodes);
        self.nodes = updater(current);
        self.revision += 1;
    }

    /// Replaces the edge collection with `updater(current)`.
    pub fn set_edges<F>(&mut self, updater: F)
    where
        F: FnOnce(EdgeList) -> EdgeList,
    {
        let current = std::mem::take(&mut self.edges);
        self.edges = updater(current);
        self.revision += 1;
    }

    /// Applies `updater` to one cell in place.
    ///
    /// Returns `false` (and changes nothing) when the cell is unknown.
    pub fn update_cell<F>(&mut self, id: &CellId, updater: F) -> bool
    where
        F: FnOnce(&mut Cell),
    {
        let Some(entry) = self.nodes.get_mut(id) else {
            return false;
        };
        updater(Arc::make_mut(entry));
        self.revision += 1;
        true
    }

    /// Replaces one cell's outputs with `updater(current)`.
    pub fn set_outputs<F>(&mut self, id: &CellId, updater: F) -> bool
    where
        F: FnOnce(Vec<CellOutput>) -> Vec<CellOutput>,
    {
        self.update_cell(id, |cell| {
            let current = std::mem::take(&mut cell.outputs);
            cell.outputs = updater(current);
        })
    }

    /// Explicit output reset.
    pub fn clear_outputs(&mut self, id: &CellId) -> bool {
        self.set_outputs(id, |_| Vec::new())
    }

    pub fn set_position(&mut self, id: &CellId, position: Position) -> bool {
        self.update_cell(id, |cell| cell.position = position)
    }

    pub fn node(&self, id: &CellId) -> Option<&Arc<Cell>> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &CellId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Arc<Edge>> {
        self.edges.get(id)
    }

    pub fn nodes(&self) -> &NodeList {
        &self.nodes
    }

    pub fn edges(&self) -> &EdgeList {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Counter bumped by every applied update.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Direct children of `id`, in first-seen order.
    pub fn children_of(&self, id: &CellId) -> Vec<&Arc<Cell>> {
        self.nodes
            .values()
            .filter(|cell| cell.parent.as_ref() == Some(id))
            .collect()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
            revision: self.revision,
        }
    }

    /// Compares stored edges with the projection of parent links.
    ///
    /// A link counts only when both its parent and child are present; a
    /// child whose parent was deleted keeps its `parent` field but has no edge.
    pub fn check_edge_invariant(&self) -> EdgeInvariantReport {
        let expected: BTreeSet<EdgeId> = self
            .nodes
            .values()
            .filter_map(|cell| {
                let parent = cell.parent.as_ref()?;
                self.nodes
                    .contains_key(parent)
                    .then(|| EdgeId::derive(parent, &cell.id))
            })
            .collect();

        let mut orphaned = Vec::new();
        for (id, edge) in &self.edges {
            let matches_link = expected.contains(id)
                && edge.id == EdgeId::derive(&edge.source, &edge.target);
            if !matches_link {
                orphaned.push(id.clone());
            }
        }
        let missing = expected
            .into_iter()
            .filter(|id| !self.edges.contains_key(id))
            .collect();

        EdgeInvariantReport { orphaned, missing }
    }
}
