//! Notebook graph domain model.
//!
//! # Responsibility
//! - Define the cell record mirrored from the server.
//! - Define derived edges and their deterministic identifiers.
//!
//! # Invariants
//! - Every cell is identified by a stable `CellId` that is never reused.
//! - Edges are never authored directly; they are projected from parent links.

pub mod cell;
pub mod edge;
