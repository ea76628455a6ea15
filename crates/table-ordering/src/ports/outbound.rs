//! Outbound Ports (Driven Ports / SPI)

use crate::domain::errors::SorterError;
use crate::domain::value_objects::{SessionHandle, TableName};
use async_trait::async_trait;

/// Schema-aware dependency sorter
///
/// Knows the authoritative reference rules between tables, which may be
/// stricter than the declared parent/child relations.
#[async_trait]
pub trait DependencySorter: Send + Sync {
    /// Open a session. One session serves a whole load batch.
    async fn open_session(&self) -> Result<SessionHandle, SorterError>;

    /// Return `tables` reordered dependents-first: every table precedes the
    /// tables it references.
    async fn sort_tables(
        &self,
        session: &SessionHandle,
        tables: &[TableName],
    ) -> Result<Vec<TableName>, SorterError>;

    /// Release a session. Unknown handles are ignored.
    async fn close_session(&self, session: SessionHandle);
}
