//! Plain-text projection of the cell graph.

use crate::model::cell::{Cell, CellId};
use crate::store::graph_store::GraphSnapshot;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::sync::Arc;

const SOURCE_PREVIEW_CHARS: usize = 40;

/// Renders the snapshot as an indented tree.
///
/// Roots are cells with no parent or whose parent is absent. Children are
/// listed in first-seen order.
pub fn render_tree(snapshot: &GraphSnapshot) -> String {
    let present: BTreeSet<&CellId> = snapshot.nodes.iter().map(|cell| &cell.id).collect();
    let mut children: BTreeMap<&CellId, Vec<&Arc<Cell>>> = BTreeMap::new();
    let mut roots = Vec::new();
    for cell in &snapshot.nodes {
        match cell.parent.as_ref().filter(|parent| present.contains(parent)) {
            Some(parent) => children.entry(parent).or_default().push(cell),
            None => roots.push(cell),
        }
    }

    let mut out = String::new();
    for root in roots {
        write_cell(&mut out, root, &children, 0);
    }
    out
}

fn write_cell(
    out: &mut String,
    cell: &Arc<Cell>,
    children: &BTreeMap<&CellId, Vec<&Arc<Cell>>>,
    depth: usize,
) {
    let _ = writeln!(
        out,
        "{}{} {:?} outputs={}{}",
        "  ".repeat(depth),
        cell.id,
        preview(&cell.source),
        cell.outputs.len(),
        if cell.running { " running" } else { "" }
    );
    if let Some(kids) = children.get(&cell.id) {
        for child in kids {
            write_cell(out, child, children, depth + 1);
        }
    }
}

fn preview(source: &str) -> String {
    let first_line = source.lines().next().unwrap_or_default();
    let mut preview: String = first_line.chars().take(SOURCE_PREVIEW_CHARS).collect();
    if first_line.chars().count() > SOURCE_PREVIEW_CHARS || source.lines().count() > 1 {
        preview.push_str("...");
    }
    preview
}
