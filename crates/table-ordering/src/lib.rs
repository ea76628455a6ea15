//! # Table Ordering Engine
//!
//! Dependency graph and CRUD ordering for configuration tables that are
//! physically split across several flat key/value tables.
//!
//! ## Architecture
//!
//! - **Domain**: Core entities (TableNode, DependencyGraph, TableOrderSnapshot)
//! - **Algorithms**: Relation loading, descendant resolution, order resolution, Kahn's sort
//! - **Ports**: Inbound (TableOrderingApi) and Outbound (DependencySorter)
//! - **Adapters**: In-process schema rule sorter
//! - **Application**: Load/reload orchestration and snapshot publication
//!
//! ## Load Pipeline
//!
//! ```text
//! descriptor.json ──► relation_loader ──► DependencyGraph
//!                                             │
//!                      descendant_resolver ◄──┘
//!                             │
//!                      order_resolver ──► DependencySorter (one session)
//!                             │
//!                      TableOrderSnapshot (atomic swap)
//! ```

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::SchemaRuleSorter;
pub use application::service::TableOrderingService;
pub use config::OrderingConfig;
pub use domain::entities::*;
pub use domain::errors::{OrderingError, SorterError};
pub use domain::value_objects::*;
pub use ports::inbound::TableOrderingApi;
pub use ports::outbound::DependencySorter;
