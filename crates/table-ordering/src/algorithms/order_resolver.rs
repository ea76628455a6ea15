//! Order Resolver
//!
//! Sorts every table's candidate set (`[T] + family`) through the external
//! dependency sorter and stores the reversed result.
//!
//! ## Direction
//!
//! The sorter answers dependents-first. Reversing gives dependencies-first,
//! which is the creation order kept in [`TableOrder`]; deletion walks it
//! backwards.

use crate::domain::entities::{DependencyGraph, DescendantMap, FinalOrderMap, TableOrder};
use crate::domain::errors::{OrderingError, SorterError};
use crate::domain::invariants::same_table_set;
use crate::domain::value_objects::{SessionHandle, TableName};
use crate::ports::outbound::DependencySorter;
use std::time::Duration;
use tracing::{debug, error};

/// Candidate set for `table`: the table itself followed by its family.
pub fn candidate_set(table: &str, descendants: &DescendantMap) -> Vec<TableName> {
    let family = descendants.get(table).map(Vec::as_slice).unwrap_or_default();
    let mut candidates = Vec::with_capacity(family.len() + 1);
    candidates.push(table.to_string());
    candidates.extend(family.iter().cloned());
    candidates
}

/// Resolve the final operation order for every table in the graph.
///
/// Opens one sorter session for the whole batch and always closes it before
/// returning. The first failing table aborts the batch; no partial map is
/// returned.
pub async fn resolve_order<S>(
    graph: &DependencyGraph,
    descendants: &DescendantMap,
    sorter: &S,
    timeout: Duration,
) -> Result<FinalOrderMap, OrderingError>
where
    S: DependencySorter + ?Sized,
{
    let session = sorter
        .open_session()
        .await
        .map_err(OrderingError::SessionUnavailable)?;

    debug!("[table-order] Opened sorter session {}", session);

    let result = sort_batch(graph, descendants, sorter, &session, timeout).await;

    sorter.close_session(session).await;
    debug!("[table-order] Closed sorter session {}", session);

    result
}

async fn sort_batch<S>(
    graph: &DependencyGraph,
    descendants: &DescendantMap,
    sorter: &S,
    session: &SessionHandle,
    timeout: Duration,
) -> Result<FinalOrderMap, OrderingError>
where
    S: DependencySorter + ?Sized,
{
    let mut orders = FinalOrderMap::with_capacity(graph.node_count());

    for node in graph.nodes() {
        let candidates = candidate_set(&node.name, descendants);

        let sorted = match tokio::time::timeout(timeout, sorter.sort_tables(session, &candidates))
            .await
        {
            Ok(Ok(sorted)) => sorted,
            Ok(Err(source)) => {
                error!("[table-order] Sorter failed for {}: {}", node.name, source);
                return Err(OrderingError::SortFailed {
                    table: node.name.clone(),
                    source,
                });
            }
            Err(_) => {
                error!("[table-order] Sorter timed out for {}", node.name);
                return Err(OrderingError::SortTimeout {
                    table: node.name.clone(),
                    timeout_ms: saturating_millis(timeout),
                });
            }
        };

        if !same_table_set(&candidates, &sorted) {
            return Err(OrderingError::SortFailed {
                table: node.name.clone(),
                source: SorterError::SetMismatch {
                    requested: candidates.len(),
                    returned: sorted.len(),
                },
            });
        }

        let mut final_order = sorted;
        final_order.reverse();
        debug!(table = %node.name, order = ?final_order, "[table-order] Resolved table order");
        orders.insert(node.name.clone(), TableOrder::new(final_order));
    }

    Ok(orders)
}

/// Whole milliseconds in `duration`, clamped to `u64::MAX`
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
