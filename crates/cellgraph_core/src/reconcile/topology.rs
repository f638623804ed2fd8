//! Topology reconciliation: hydration, create and delete confirmations.
//!
//! # Invariants
//! - All inserts are upserts keyed by id; replaying an event is harmless.
//! - An edge exists exactly when both its parent and child are present, so
//!   snapshot order never matters and a delete cascades to every touching edge.

use crate::model::cell::{Cell, CellId};
use crate::model::edge::{Edge, EdgeId};
use crate::protocol::{CreateCell, MessageKind, ServerMessage};
use crate::reconcile::router::EventSubscriber;
use crate::store::GraphStore;
use indexmap::IndexMap;
use log::{debug, info};
use std::sync::Arc;

const TOPOLOGY_KINDS: &[MessageKind] = &[
    MessageKind::Notebook,
    MessageKind::DidCreateCell,
    MessageKind::DidDeleteCell,
];

/// Applies node/edge membership changes.
pub struct TopologyReconciler;

impl EventSubscriber for TopologyReconciler {
    fn name(&self) -> &str {
        "topology"
    }

    fn kinds(&self) -> &[MessageKind] {
        TOPOLOGY_KINDS
    }

    fn handle(&mut self, message: &ServerMessage, store: &mut GraphStore) {
        match message {
            ServerMessage::Notebook(snapshot) => hydrate(store, &snapshot.cells),
            ServerMessage::DidCreateCell { request } => confirm_create(store, request),
            ServerMessage::DidDeleteCell { request } => confirm_delete(store, &request.cell),
            _ => {}
        }
    }
}

/// Upserts every snapshot cell, carrying its source/outputs/position through.
///
/// Snapshot entries are authoritative for content and replace what is stored.
pub fn hydrate(store: &mut GraphStore, cells: &[Cell]) {
    store.set_nodes(|mut nodes| {
        for cell in cells {
            nodes.insert(cell.id.clone(), Arc::new(cell.clone()));
        }
        nodes
    });
    relink_all(store);
    info!(
        "event=hydrate module=reconcile status=ok cells={} nodes={} edges={}",
        cells.len(),
        store.node_count(),
        store.edge_count()
    );
}

/// Materializes a confirmed create as a blank cell plus its edge.
///
/// A cell that is already present keeps its mirrored content.
pub fn confirm_create(store: &mut GraphStore, request: &CreateCell) {
    if store.contains_node(&request.cell) {
        debug!(
            "event=confirm_create module=reconcile status=skip reason=known_cell cell={}",
            request.cell
        );
        return;
    }
    let cell = Cell::new(request.cell.clone(), request.parent.clone());
    store.set_nodes(|mut nodes| {
        nodes.insert(cell.id.clone(), Arc::new(cell));
        nodes
    });
    link_cell(store, &request.cell);
    debug!(
        "event=confirm_create module=reconcile status=ok cell={}",
        request.cell
    );
}

/// Removes a confirmed delete and every edge touching it.
pub fn confirm_delete(store: &mut GraphStore, id: &CellId) {
    if !store.contains_node(id) {
        debug!("event=confirm_delete module=reconcile status=skip reason=unknown_cell cell={id}");
        return;
    }
    store.set_nodes(|mut nodes| {
        nodes.shift_remove(id);
        nodes
    });
    store.set_edges(|mut edges| {
        edges.retain(|_, edge| !edge.touches(id));
        edges
    });
    debug!("event=confirm_delete module=reconcile status=ok cell={id}");
}

/// Rebuilds the edge set from every parent link in one pass.
fn relink_all(store: &mut GraphStore) {
    let wanted: IndexMap<EdgeId, Edge> = store
        .nodes()
        .values()
        .filter_map(|cell| {
            let parent = cell.parent.as_ref()?;
            store
                .contains_node(parent)
                .then(|| Edge::between(parent.clone(), cell.id.clone()))
        })
        .map(|edge| (edge.id.clone(), edge))
        .collect();

    store.set_edges(|mut edges| {
        edges.retain(|id, _| wanted.contains_key(id));
        for (id, edge) in wanted {
            // Why: snapshot consumers compare unchanged edges by pointer.
            edges.entry(id).or_insert_with(|| Arc::new(edge));
        }
        edges
    });
}

/// Brings the edges around a newly inserted `id` in line with the parent links.
fn link_cell(store: &mut GraphStore, id: &CellId) {
    let Some(cell) = store.node(id) else {
        return;
    };
    let parent = cell.parent.clone();

    let mut wanted = Vec::new();
    if let Some(parent) = parent.as_ref().filter(|parent| store.contains_node(parent)) {
        wanted.push(Edge::between(parent.clone(), id.clone()));
    }
    wanted.extend(
        store
            .children_of(id)
            .into_iter()
            .map(|child| Edge::between(id.clone(), child.id.clone())),
    );

    store.set_edges(|mut edges| {
        edges.retain(|_, edge| &edge.target != id || Some(&edge.source) == parent.as_ref());
        for edge in wanted {
            edges
                .entry(edge.id.clone())
                .or_insert_with(|| Arc::new(edge));
        }
        edges
    });
}
