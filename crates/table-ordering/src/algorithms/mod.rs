//! Algorithms module for Table Ordering
//!
//! Contains:
//! - Relation loader
//! - Descendant resolver
//! - Order resolver
//! - Kahn's topological sort

pub mod descendant_resolver;
pub mod kahns;
pub mod order_resolver;
pub mod relation_loader;

pub use descendant_resolver::resolve_descendants;
pub use kahns::kahns_topological_sort;
pub use order_resolver::{candidate_set, resolve_order};
pub use relation_loader::{build_graph, load_graph, parse_descriptor, read_descriptor};
