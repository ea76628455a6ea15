//! Kahn's Topological Sort Algorithm
//!
//! O(V + E log V), detects cycles. Nodes are positions in the caller's input
//! list; among nodes that are ready at the same time the lowest position goes
//! first, so the same input always yields the same order.

use std::collections::BTreeSet;

/// Sort `node_count` nodes so that for every edge `(from, to)`, `from`
/// precedes `to`.
///
/// On a cycle, returns the nodes that could not be scheduled, in position
/// order.
pub fn kahns_topological_sort(
    node_count: usize,
    edges: &[(usize, usize)],
) -> Result<Vec<usize>, Vec<usize>> {
    // 1. Adjacency and in-degree
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree: Vec<usize> = vec![0; node_count];
    for &(from, to) in edges {
        adjacency[from].push(to);
        in_degree[to] += 1;
    }

    // 2. Ready set, ordered by input position
    let mut ready: BTreeSet<usize> = (0..node_count).filter(|&n| in_degree[n] == 0).collect();

    // 3. Process
    let mut order = Vec::with_capacity(node_count);
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &next in &adjacency[node] {
            in_degree[next] = in_degree[next].saturating_sub(1);
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    // 4. Cycle detection: if not all nodes scheduled, there's a cycle
    if order.len() < node_count {
        let stuck = (0..node_count).filter(|&n| in_degree[n] > 0).collect();
        return Err(stuck);
    }

    Ok(order)
}
