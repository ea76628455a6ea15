//! Adapters for Table Ordering
//!
//! Concrete implementations of the outbound ports.

pub mod schema_sorter;

pub use schema_sorter::SchemaRuleSorter;
