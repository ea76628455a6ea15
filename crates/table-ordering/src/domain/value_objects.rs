//! Value objects for Table Ordering

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Logical storage table name (e.g. `VLAN`, `VLAN_MEMBER`)
pub type TableName = String;

/// Index of a node inside the dependency graph arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub usize);

impl TableId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle for one open session on the external dependency sorter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub Uuid);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the descendant resolver does when declared relations form a cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Fail the load with the offending cycle
    #[default]
    Reject,
    /// Terminate traversal and keep whatever partial families were resolved
    BestEffort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_handles_are_unique() {
        assert_ne!(SessionHandle::new(), SessionHandle::new());
    }

    #[test]
    fn test_cycle_policy_default_is_reject() {
        assert_eq!(CyclePolicy::default(), CyclePolicy::Reject);
    }

    #[test]
    fn test_cycle_policy_serde_names() {
        let policy: CyclePolicy = serde_json::from_str("\"best_effort\"").unwrap();
        assert_eq!(policy, CyclePolicy::BestEffort);
        assert_eq!(
            serde_json::to_string(&CyclePolicy::Reject).unwrap(),
            "\"reject\""
        );
    }
}
