//! Domain invariants for Table Ordering

use super::entities::{DependencyGraph, DescendantMap, TableOrderSnapshot};
use super::value_objects::{TableId, TableName};
use std::collections::{HashMap, HashSet};

/// INVARIANT-1: Family Closure
/// Every declared child of P, and every child of anything below P, is in P's family.
pub fn invariant_family_closure(graph: &DependencyGraph, descendants: &DescendantMap) -> bool {
    for node in graph.nodes() {
        let Some(family) = descendants.get(&node.name) else {
            return false;
        };
        let members: HashSet<&str> = family.iter().map(String::as_str).collect();

        let mut below: Vec<TableId> = node.children.clone();
        for name in family {
            if let Some(id) = graph.lookup(name) {
                below.extend(graph.node(id).children.iter().copied());
            }
        }

        for child in below {
            let child_name = graph.node(child).name.as_str();
            if child_name != node.name && !members.contains(child_name) {
                return false;
            }
        }
    }

    true
}

/// INVARIANT-2: No Self Descendant
/// A table never appears in its own family.
pub fn invariant_no_self_descendant(descendants: &DescendantMap) -> bool {
    descendants
        .iter()
        .all(|(table, family)| !family.contains(table))
}

/// INVARIANT-3: Unique Descendants
/// Every name appears at most once per family.
pub fn invariant_unique_descendants(descendants: &DescendantMap) -> bool {
    descendants.values().all(|family| {
        let mut seen = HashSet::new();
        family.iter().all(|name| seen.insert(name))
    })
}

/// INVARIANT-4: Order Completeness
/// Every final order holds exactly `{T} ∪ DescendantMap[T]`, each once.
pub fn invariant_order_completeness(snapshot: &TableOrderSnapshot) -> bool {
    if snapshot.orders.len() != snapshot.descendants.len() {
        return false;
    }

    snapshot.descendants.iter().all(|(table, family)| {
        let Some(order) = snapshot.orders.get(table) else {
            return false;
        };
        let mut expected = Vec::with_capacity(family.len() + 1);
        expected.push(table.clone());
        expected.extend(family.iter().cloned());
        same_table_set(&expected, order.as_slice())
    })
}

/// True if both slices hold the same names with the same multiplicity
pub fn same_table_set(expected: &[TableName], actual: &[TableName]) -> bool {
    if expected.len() != actual.len() {
        return false;
    }

    let mut counts: HashMap<&str, isize> = HashMap::new();
    for name in expected {
        *counts.entry(name.as_str()).or_insert(0) += 1;
    }
    for name in actual {
        *counts.entry(name.as_str()).or_insert(0) -= 1;
    }

    counts.values().all(|&count| count == 0)
}

/// INVARIANT-5: No Cycles
/// The declared relations form a DAG.
pub fn invariant_no_cycles(graph: &DependencyGraph) -> bool {
    let mut visited = vec![false; graph.node_count()];
    let mut on_stack = vec![false; graph.node_count()];

    for node in graph.nodes() {
        if !visited[node.id.index()] && has_cycle_from(graph, node.id, &mut visited, &mut on_stack)
        {
            return false;
        }
    }

    true
}

/// Depth-first walk from `root` on an explicit `(node, next child)` stack
fn has_cycle_from(
    graph: &DependencyGraph,
    root: TableId,
    visited: &mut [bool],
    on_stack: &mut [bool],
) -> bool {
    visited[root.index()] = true;
    on_stack[root.index()] = true;
    let mut stack: Vec<(TableId, usize)> = vec![(root, 0)];

    while let Some((node, next_child)) = stack.last_mut() {
        let Some(&child) = graph.node(*node).children.get(*next_child) else {
            on_stack[node.index()] = false;
            stack.pop();
            continue;
        };
        *next_child += 1;

        if on_stack[child.index()] {
            return true;
        }
        if !visited[child.index()] {
            visited[child.index()] = true;
            on_stack[child.index()] = true;
            stack.push((child, 0));
        }
    }

    false
}
