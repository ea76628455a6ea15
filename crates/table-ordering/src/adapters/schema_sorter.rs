//! Schema Rule Sorter Adapter
//!
//! Implements `DependencySorter` over a static set of table reference rules,
//! the way the schema engine orders tables that point at each other through
//! leafref-style keys.

use crate::algorithms::kahns_topological_sort;
use crate::domain::errors::SorterError;
use crate::domain::value_objects::{SessionHandle, TableName};
use crate::ports::outbound::DependencySorter;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Orders tables dependents-first from `table -> referenced tables` rules.
///
/// References are followed transitively, including through tables that are
/// not part of the request. Tables without rules are unconstrained and keep
/// their request position.
pub struct SchemaRuleSorter {
    references: HashMap<TableName, Vec<TableName>>,
    sessions: RwLock<HashSet<SessionHandle>>,
}

impl SchemaRuleSorter {
    pub fn new() -> Self {
        Self {
            references: HashMap::new(),
            sessions: RwLock::new(HashSet::new()),
        }
    }

    /// Build from `(table, referenced)` pairs
    pub fn from_rules<I, A, B>(rules: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<TableName>,
        B: Into<TableName>,
    {
        let mut sorter = Self::new();
        for (table, referenced) in rules {
            sorter.add_reference(table, referenced);
        }
        sorter
    }

    /// Declare that `table` holds references into `referenced`
    pub fn add_reference(&mut self, table: impl Into<TableName>, referenced: impl Into<TableName>) {
        let referenced = referenced.into();
        let targets = self.references.entry(table.into()).or_default();
        if !targets.contains(&referenced) {
            targets.push(referenced);
        }
    }

    /// Number of sessions currently open
    pub fn open_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    /// Tables reachable from `table` through reference rules
    fn reachable(&self, table: &str) -> HashSet<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![table];

        while let Some(current) = stack.pop() {
            let Some(targets) = self.references.get(current) else {
                continue;
            };
            for target in targets {
                if seen.insert(target.as_str()) {
                    stack.push(target.as_str());
                }
            }
        }

        seen
    }

    /// Sort without session checks
    fn order(&self, tables: &[TableName]) -> Result<Vec<TableName>, SorterError> {
        let position: HashMap<&str, usize> = tables
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut edges = Vec::new();
        for (from, table) in tables.iter().enumerate() {
            for target in self.reachable(table) {
                match position.get(target) {
                    Some(&to) if to != from => edges.push((from, to)),
                    _ => {}
                }
            }
        }

        match kahns_topological_sort(tables.len(), &edges) {
            Ok(order) => Ok(order.into_iter().map(|i| tables[i].clone()).collect()),
            Err(stuck) => {
                let names: Vec<&str> = stuck.iter().map(|&i| tables[i].as_str()).collect();
                warn!("[table-order] Reference cycle among {:?}", names);
                Err(SorterError::Rejected(format!(
                    "reference cycle among {}",
                    names.join(", ")
                )))
            }
        }
    }
}

impl Default for SchemaRuleSorter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DependencySorter for SchemaRuleSorter {
    async fn open_session(&self) -> Result<SessionHandle, SorterError> {
        let session = SessionHandle::new();
        self.sessions.write().insert(session);
        debug!("[table-order] Schema sorter session {} opened", session);
        Ok(session)
    }

    async fn sort_tables(
        &self,
        session: &SessionHandle,
        tables: &[TableName],
    ) -> Result<Vec<TableName>, SorterError> {
        if !self.sessions.read().contains(session) {
            return Err(SorterError::UnknownSession);
        }
        self.order(tables)
    }

    async fn close_session(&self, session: SessionHandle) {
        if self.sessions.write().remove(&session) {
            debug!("[table-order] Schema sorter session {} closed", session);
        }
    }
}
