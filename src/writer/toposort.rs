//! Parents-first ordering for rows of a self-referencing table.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph};

use crate::Row;

/// Error raised when self-referencing rows cannot be ordered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("Self-referencing rows form a cycle at key {key}")]
    Cycle { key: String },

    #[error("Row {key} references parent {parent}, which is not present")]
    MissingParent { key: String, parent: String },
}

fn display_key(key: Option<&str>) -> String {
    key.unwrap_or("NULL").to_string()
}

/// Sorts `rows` so every row comes after the row it references.
///
/// `key_index` is the column identifying a row and `parent_index` the column
/// holding the parent's key. Rows without a parent keep their relative order
/// as far as the dependency allows.
pub fn sort_topologically(
    rows: Vec<Row>,
    key_index: usize,
    parent_index: usize,
) -> Result<Vec<Row>, IntegrityError> {
    let field = |row: &Row, idx: usize| -> Option<String> { row.get(idx).cloned().flatten() };

    // Edges point from parent to child
    let mut graph = Graph::<Option<String>, (), Directed>::new();
    let mut node_map: HashMap<Option<String>, NodeIndex> = HashMap::new();
    for row in &rows {
        let key = field(row, key_index);
        node_map
            .entry(key.clone())
            .or_insert_with(|| graph.add_node(key));
    }

    for row in &rows {
        let key = field(row, key_index);
        let Some(parent) = field(row, parent_index) else {
            continue;
        };
        if key.as_deref() == Some(parent.as_str()) {
            return Err(IntegrityError::Cycle {
                key: display_key(key.as_deref()),
            });
        }
        let Some(&parent_node) = node_map.get(&Some(parent.clone())) else {
            return Err(IntegrityError::MissingParent {
                key: display_key(key.as_deref()),
                parent,
            });
        };
        let child_node = node_map[&key];
        graph.update_edge(parent_node, child_node, ());
    }

    let order = toposort(&graph, None).map_err(|cycle| IntegrityError::Cycle {
        key: display_key(graph[cycle.node_id()].as_deref()),
    })?;

    let mut position = vec![0usize; graph.node_count()];
    for (pos, node) in order.iter().enumerate() {
        position[node.index()] = pos;
    }

    let mut rows = rows;
    rows.sort_by_key(|row| position[node_map[&field(row, key_index)].index()]);
    Ok(rows)
}
