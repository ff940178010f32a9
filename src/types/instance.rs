//! Normalized instance state and power-state classification.

use std::collections::HashMap;

/// Label carrying the instance flavor.
pub const LABEL_INSTANCE_TYPE: &str = "k8s.io.infra.vnetwork.dev/instance-type";

/// Label carrying the owning cluster's identifier.
pub const LABEL_CLUSTER_ID: &str = "k8s.io.infra.vnetwork.dev/cluster-id";

/// Power states that mean the instance is down (but still exists).
const SHUTDOWN_STATES: &[&str] = &[
    "POWERED_OFF",
    "SUSPENDED",
    "TERMINATED",
    "BACKUP",
    "BACKUP_POWEROFF",
];

/// Resolved view of a remote instance.
///
/// When `exists` is false every other field is unset and must not be read;
/// `shutdown` is only meaningful for existing instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceRecord {
    pub exists: bool,
    pub shutdown: bool,
    pub provider_id: String,
    pub instance_type: String,
    pub zone: String,
    pub region: String,
    pub internal_address: String,
    pub extra_labels: HashMap<String, String>,
}

impl InstanceRecord {
    /// Record for an instance confirmed not to exist (404 or terminated).
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Classify a remote power state.
///
/// Only the closed set of shutdown states maps to `true`; unknown or empty
/// states are treated as running.
pub fn is_shutdown_state(state: &str) -> bool {
    SHUTDOWN_STATES.contains(&state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_states_classified_as_shutdown() {
        for state in SHUTDOWN_STATES {
            assert!(is_shutdown_state(state), "{state} should be shutdown");
        }
    }

    #[test]
    fn other_states_classified_as_running() {
        for state in ["RUNNING", "POWERED_ON", "", "powered_off", "MIGRATING"] {
            assert!(!is_shutdown_state(state), "{state:?} should be running");
        }
    }

    #[test]
    fn absent_record_does_not_exist() {
        let record = InstanceRecord::absent();
        assert!(!record.exists);
        assert!(record.provider_id.is_empty());
    }
}
