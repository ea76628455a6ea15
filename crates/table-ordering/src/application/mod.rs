//! Application layer for Table Ordering

pub mod service;

pub use service::TableOrderingService;
