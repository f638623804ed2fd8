//! Flutter-facing bindings for the cellgraph sync engine.

pub mod api;
