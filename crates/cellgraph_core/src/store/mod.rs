//! Client-side graph state.
//!
//! # Responsibility
//! - Hold the node and edge collections mirrored from the server.
//! - Apply every mutation as a function of the current collection.
//! - Hand cheap read-only snapshots to the renderer.
//!
//! # Invariants
//! - Updaters receive the latest collection by value; no caller ever holds a
//!   stale copy that could overwrite a newer one.
//! - Per-cell updates replace only the addressed entry; siblings keep their
//!   `Arc` identity.
//! - At rest, the edge set is the projection of parent links between present
//!   cells (see `GraphStore::check_edge_invariant`).

pub mod graph_store;
pub mod view;

pub use graph_store::{EdgeInvariantReport, EdgeList, GraphSnapshot, GraphStore, NodeList};
pub use view::render_tree;
