//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{RelationDescriptor, TableOrder, TableOrderSnapshot};
use crate::domain::errors::OrderingError;
use crate::domain::value_objects::TableName;
use async_trait::async_trait;
use std::sync::Arc;

/// Primary Table Ordering API
#[async_trait]
pub trait TableOrderingApi: Send + Sync {
    /// Load the configured descriptor and publish a new snapshot.
    ///
    /// This is the main entry point. It:
    /// 1. Parses the relation descriptor into a graph
    /// 2. Resolves every table's descendant family
    /// 3. Sorts each family through one sorter session
    /// 4. Swaps the published snapshot
    ///
    /// On error the previously published snapshot stays in effect.
    async fn load(&self) -> Result<Arc<TableOrderSnapshot>, OrderingError>;

    /// Same as [`load`](Self::load) for an in-memory descriptor.
    async fn load_descriptor(
        &self,
        descriptor: &RelationDescriptor,
    ) -> Result<Arc<TableOrderSnapshot>, OrderingError>;

    /// Currently published snapshot, if any
    fn snapshot(&self) -> Option<Arc<TableOrderSnapshot>>;

    /// Operation order for `table`'s family.
    ///
    /// `Ok(None)` means the table is not part of the loaded relations.
    fn table_order(&self, table: &str) -> Result<Option<TableOrder>, OrderingError>;

    /// Full descendant family of `table`
    fn descendants(&self, table: &str) -> Result<Option<Vec<TableName>>, OrderingError>;
}
