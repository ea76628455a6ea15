//! Ports module for Table Ordering
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::TableOrderingApi;
pub use outbound::DependencySorter;
