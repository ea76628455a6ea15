//! Error types for Table Ordering

use super::value_objects::TableName;
use thiserror::Error;

/// All errors that can abort a load
#[derive(Debug, Error)]
pub enum OrderingError {
    /// Descriptor file missing or unreadable
    #[error("Failed to read relation descriptor {path}: {source}")]
    DescriptorRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor is not valid JSON or has the wrong shape
    #[error("Failed to parse relation descriptor: {0}")]
    DescriptorParse(#[from] serde_json::Error),

    /// A relation entry names an empty table or parent
    #[error("Invalid relation at index {index}: {reason}")]
    InvalidRelation { index: usize, reason: String },

    /// Table count exceeded limits
    #[error("Table count exceeded: {count} > {max}")]
    TooManyTables { count: usize, max: usize },

    /// Declared relations contain a cycle
    #[error("Cycle detected in table relations: {}", path.join(" -> "))]
    CycleDetected { path: Vec<TableName> },

    /// Could not open a session on the dependency sorter
    #[error("Dependency sorter unavailable: {0}")]
    SessionUnavailable(SorterError),

    /// Sorting one table's family failed
    #[error("Failed to sort tables for {table}: {source}")]
    SortFailed {
        table: TableName,
        #[source]
        source: SorterError,
    },

    /// Sorting one table's family did not finish in time
    #[error("Sorting tables for {table} timed out after {timeout_ms}ms")]
    SortTimeout { table: TableName, timeout_ms: u64 },

    /// No snapshot has been published yet
    #[error("Table order not loaded")]
    NotLoaded,
}

/// Errors reported by a dependency sorter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SorterError {
    #[error("Sorter unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown or closed session")]
    UnknownSession,

    #[error("Sort rejected: {0}")]
    Rejected(String),

    /// Sorter returned a different set of tables than it was given
    #[error("Sorter returned {returned} tables for {requested} candidates")]
    SetMismatch { requested: usize, returned: usize },
}
