//! Relation Loader
//!
//! Turns the declarative `(table, parent)` list into a [`DependencyGraph`].

use crate::domain::entities::{DependencyGraph, RelationDescriptor, TableRelation};
use crate::domain::errors::OrderingError;
use std::path::Path;
use tracing::debug;

/// Parse a descriptor from JSON text.
pub fn parse_descriptor(json: &str) -> Result<RelationDescriptor, OrderingError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a descriptor file.
pub fn read_descriptor(path: &Path) -> Result<RelationDescriptor, OrderingError> {
    let json = std::fs::read_to_string(path).map_err(|source| OrderingError::DescriptorRead {
        path: path.display().to_string(),
        source,
    })?;
    parse_descriptor(&json)
}

/// Build the dependency graph from a descriptor.
///
/// Nodes are created on first mention (child or parent). Each child is
/// appended to its parent's child list in declaration order; repeated
/// relations are ignored. Nothing is returned unless every relation is valid.
pub fn build_graph(
    descriptor: &RelationDescriptor,
    max_tables: usize,
) -> Result<DependencyGraph, OrderingError> {
    for (index, relation) in descriptor.relations.iter().enumerate() {
        validate_relation(index, relation)?;
    }

    let mut graph = DependencyGraph::new();

    for relation in &descriptor.relations {
        let child = graph.ensure_node(&relation.table);
        let Some(parent_name) = relation.parent.as_deref() else {
            continue;
        };
        let parent = graph.ensure_node(parent_name);

        if !graph.add_edge(parent, child) {
            debug!(
                "[table-order] Duplicate relation {} -> {} ignored",
                parent_name, relation.table
            );
        }
    }

    if graph.node_count() > max_tables {
        return Err(OrderingError::TooManyTables {
            count: graph.node_count(),
            max: max_tables,
        });
    }

    debug!(
        tables = graph.node_count(),
        relations = graph.edge_count(),
        "[table-order] Built table dependency graph"
    );

    Ok(graph)
}

/// Read a descriptor file and build its graph.
pub fn load_graph(path: &Path, max_tables: usize) -> Result<DependencyGraph, OrderingError> {
    let descriptor = read_descriptor(path)?;
    build_graph(&descriptor, max_tables)
}

fn validate_relation(index: usize, relation: &TableRelation) -> Result<(), OrderingError> {
    if relation.table.trim().is_empty() {
        return Err(OrderingError::InvalidRelation {
            index,
            reason: "empty table name".into(),
        });
    }
    if matches!(relation.parent.as_deref(), Some(parent) if parent.trim().is_empty()) {
        return Err(OrderingError::InvalidRelation {
            index,
            reason: format!("empty parent name for table {}", relation.table),
        });
    }
    Ok(())
}
