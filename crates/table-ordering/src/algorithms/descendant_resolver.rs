//! Descendant Resolver
//!
//! Depth-first walk computing, for every table, the ordered list of all
//! tables reachable below it. Results are memoized per table so a family
//! reached through a second parent is reused, not recomputed.

use crate::domain::entities::{DependencyGraph, DescendantMap};
use crate::domain::errors::OrderingError;
use crate::domain::value_objects::{CyclePolicy, TableId, TableName};
use std::collections::HashSet;
use tracing::warn;

/// Resolve the descendant family of every table in the graph.
///
/// Families follow child declaration order, child name first and then the
/// child's own family, with repeated names dropped. A table never appears in
/// its own family.
pub fn resolve_descendants(
    graph: &DependencyGraph,
    policy: CyclePolicy,
) -> Result<DescendantMap, OrderingError> {
    let mut traversal = Traversal::new(graph, policy);

    for node in graph.nodes() {
        if traversal.resolved[node.id.index()].is_none() {
            traversal.visit(node.id)?;
        }
    }

    Ok(traversal.into_map())
}

/// Traversal state, kept outside the graph nodes
struct Traversal<'g> {
    graph: &'g DependencyGraph,
    policy: CyclePolicy,
    /// Marked on entry, cleared once the node's family is resolved
    visiting: Vec<bool>,
    /// Current DFS path, for cycle reporting
    path: Vec<TableId>,
    resolved: Vec<Option<Vec<TableId>>>,
}

/// One open node on the explicit DFS stack
struct Frame {
    id: TableId,
    next_child: usize,
    family: Vec<TableId>,
    seen: HashSet<TableId>,
}

impl Frame {
    /// Append `child` and its resolved family, skipping names already present
    fn absorb(&mut self, child: TableId, resolved: &[Option<Vec<TableId>>]) {
        if self.seen.insert(child) {
            self.family.push(child);
        }
        if let Some(below) = &resolved[child.index()] {
            for &descendant in below {
                if self.seen.insert(descendant) {
                    self.family.push(descendant);
                }
            }
        }
    }
}

impl<'g> Traversal<'g> {
    fn new(graph: &'g DependencyGraph, policy: CyclePolicy) -> Self {
        let count = graph.node_count();
        Self {
            graph,
            policy,
            visiting: vec![false; count],
            path: Vec::new(),
            resolved: vec![None; count],
        }
    }

    /// Resolve `root` and everything below it.
    ///
    /// Iterative so that chain depth costs heap, not thread stack.
    fn visit(&mut self, root: TableId) -> Result<(), OrderingError> {
        let graph = self.graph;
        let mut stack = vec![self.enter(root)];

        while let Some(frame) = stack.last_mut() {
            let node = graph.node(frame.id);

            let Some(&child) = node.children.get(frame.next_child) else {
                if let Some(done) = stack.pop() {
                    self.finish(done, stack.last_mut());
                }
                continue;
            };
            frame.next_child += 1;

            if self.resolved[child.index()].is_some() {
                frame.absorb(child, &self.resolved);
                continue;
            }

            if self.visiting[child.index()] {
                match self.policy {
                    CyclePolicy::Reject => return Err(self.cycle_error(child)),
                    CyclePolicy::BestEffort => {
                        warn!(
                            "[table-order] Cycle through {} -> {}, family of {} may be incomplete",
                            node.name,
                            graph.node(child).name,
                            node.name
                        );
                        continue;
                    }
                }
            }

            let next = self.enter(child);
            stack.push(next);
        }

        Ok(())
    }

    fn enter(&mut self, id: TableId) -> Frame {
        self.visiting[id.index()] = true;
        self.path.push(id);
        Frame {
            id,
            next_child: 0,
            family: Vec::new(),
            seen: HashSet::from([id]),
        }
    }

    /// Memoize a finished node and hand its family to the parent frame
    fn finish(&mut self, done: Frame, parent: Option<&mut Frame>) {
        let id = done.id;
        self.path.pop();
        self.visiting[id.index()] = false;
        self.resolved[id.index()] = Some(done.family);
        if let Some(parent) = parent {
            parent.absorb(id, &self.resolved);
        }
    }

    fn cycle_error(&self, back_to: TableId) -> OrderingError {
        let start = self
            .path
            .iter()
            .position(|id| *id == back_to)
            .unwrap_or(0);
        let mut path: Vec<TableName> = self.path[start..]
            .iter()
            .map(|id| self.graph.node(*id).name.clone())
            .collect();
        path.push(self.graph.node(back_to).name.clone());
        OrderingError::CycleDetected { path }
    }

    fn into_map(self) -> DescendantMap {
        let graph = self.graph;
        self.resolved
            .into_iter()
            .enumerate()
            .map(|(index, family)| {
                let names = family
                    .unwrap_or_default()
                    .into_iter()
                    .map(|id| graph.node(id).name.clone())
                    .collect();
                (graph.node(TableId(index)).name.clone(), names)
            })
            .collect()
    }
}
