//! Core entities for Table Ordering

use super::value_objects::{TableId, TableName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One declared relation: `table` is a child of `parent`.
///
/// A relation without a parent only declares the table, so it shows up in
/// the published maps even when nothing else references it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRelation {
    pub table: TableName,
    #[serde(default)]
    pub parent: Option<TableName>,
}

impl TableRelation {
    pub fn child(table: impl Into<TableName>, parent: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            parent: Some(parent.into()),
        }
    }

    pub fn root(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
            parent: None,
        }
    }
}

/// Declarative relation list as stored in the descriptor file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    #[serde(default)]
    pub relations: Vec<TableRelation>,
}

impl RelationDescriptor {
    pub fn new(relations: Vec<TableRelation>) -> Self {
        Self { relations }
    }
}

/// Graph node for one logical storage table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableNode {
    pub id: TableId,
    pub name: TableName,
    /// Direct children in declaration order
    pub children: Vec<TableId>,
}

/// Parent → child graph over storage tables.
///
/// Nodes live in an arena indexed by [`TableId`]; arena order is the order
/// in which tables were first mentioned.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<TableNode>,
    index: HashMap<TableName, TableId>,
    edge_count: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node id for `name`, creating the node on first mention
    pub fn ensure_node(&mut self, name: &str) -> TableId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = TableId(self.nodes.len());
        self.nodes.push(TableNode {
            id,
            name: name.to_string(),
            children: Vec::new(),
        });
        self.index.insert(name.to_string(), id);
        id
    }

    /// Append `child` to `parent`'s child list.
    ///
    /// Returns false if the edge already existed. Both ids must come from
    /// this graph.
    pub(crate) fn add_edge(&mut self, parent: TableId, child: TableId) -> bool {
        let children = &mut self.nodes[parent.index()].children;
        if children.contains(&child) {
            return false;
        }
        children.push(child);
        self.edge_count += 1;
        true
    }

    /// Arena access for ids handed out by this graph
    pub(crate) fn node(&self, id: TableId) -> &TableNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: TableId) -> Option<&TableNode> {
        self.nodes.get(id.index())
    }

    pub fn lookup(&self, name: &str) -> Option<TableId> {
        self.index.get(name).copied()
    }

    pub fn nodes(&self) -> &[TableNode] {
        &self.nodes
    }

    /// Check if `child` is declared directly under `parent`
    pub fn has_edge(&self, parent: &str, child: &str) -> bool {
        match (self.lookup(parent), self.lookup(child)) {
            (Some(p), Some(c)) => self.node(p).children.contains(&c),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Table name → full ordered descendant family
pub type DescendantMap = HashMap<TableName, Vec<TableName>>;

/// Operation order for one table's family.
///
/// Stored dependencies-first: parents precede the tables that reference
/// them, which is the order to create or update in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOrder {
    tables: Vec<TableName>,
}

impl TableOrder {
    pub fn new(tables: Vec<TableName>) -> Self {
        Self { tables }
    }

    /// Tables in the order they must be created or updated
    pub fn creation_order(&self) -> impl DoubleEndedIterator<Item = &TableName> + '_ {
        self.tables.iter()
    }

    /// Tables in the order they must be removed
    pub fn deletion_order(&self) -> impl DoubleEndedIterator<Item = &TableName> + '_ {
        self.tables.iter().rev()
    }

    pub fn as_slice(&self) -> &[TableName] {
        &self.tables
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Table name → final operation order for its family
pub type FinalOrderMap = HashMap<TableName, TableOrder>;

/// Everything one successful load produces, published as a unit
#[derive(Clone, Debug, Default)]
pub struct TableOrderSnapshot {
    /// Incremented on every successful publish
    pub version: u64,
    pub descendants: DescendantMap,
    pub orders: FinalOrderMap,
}

impl TableOrderSnapshot {
    pub fn order(&self, table: &str) -> Option<&TableOrder> {
        self.orders.get(table)
    }

    pub fn descendants(&self, table: &str) -> Option<&[TableName]> {
        self.descendants.get(table).map(Vec::as_slice)
    }

    pub fn table_count(&self) -> usize {
        self.orders.len()
    }
}
