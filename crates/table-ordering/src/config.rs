//! Configuration for Table Ordering

use crate::domain::value_objects::CyclePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Ordering configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Relation descriptor read by `load()`
    pub descriptor_path: PathBuf,
    /// Upper bound for a single sorter call (milliseconds)
    pub sort_timeout_ms: u64,
    /// Handling of cyclic relations
    pub cycle_policy: CyclePolicy,
    /// Maximum distinct tables in one descriptor (anti-DoS)
    pub max_tables: usize,
}

impl OrderingConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_descriptor_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.descriptor_path = path.into();
        self
    }

    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    pub fn sort_timeout(&self) -> Duration {
        Duration::from_millis(self.sort_timeout_ms)
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            descriptor_path: PathBuf::from("table_relations.json"),
            sort_timeout_ms: 5_000,
            cycle_policy: CyclePolicy::Reject,
            max_tables: 4_096,
        }
    }
}
