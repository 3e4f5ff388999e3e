//! # Snapshot document for process-restart recovery.
//!
//! [`Snapshot`] serializes the full supervisor state — every descriptor
//! (including runtime status and restart counters) plus the health history —
//! as one camelCase JSON document:
//!
//! ```json
//! { "services": [...], "healthChecks": [...], "lastUpdate": "..." }
//! ```
//!
//! Export/import live on the supervisor facade
//! ([`Supervisor::export_snapshot`](crate::Supervisor::export_snapshot) /
//! [`Supervisor::import_snapshot`](crate::Supervisor::import_snapshot));
//! this module owns the document shape and its JSON codec. File or network
//! IO is left to the composition root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SupervisorError;
use crate::health::HealthRecord;
use crate::services::ServiceDescriptor;

/// Full supervisor state at one point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Every registered descriptor, runtime state included.
    pub services: Vec<ServiceDescriptor>,
    /// Every retained health record, ordered by timestamp.
    pub health_checks: Vec<HealthRecord>,
    /// When the snapshot was taken.
    pub last_update: DateTime<Utc>,
}

impl Snapshot {
    /// Serializes the snapshot to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SupervisorError> {
        serde_json::to_string_pretty(self).map_err(|e| SupervisorError::Snapshot {
            reason: e.to_string(),
        })
    }

    /// Parses a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, SupervisorError> {
        serde_json::from_str(json).map_err(|e| SupervisorError::Snapshot {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{Health, HealthState};
    use crate::services::ServiceStatus;
    use std::time::Duration;

    #[test]
    fn test_json_round_trip() {
        let mut descriptor = ServiceDescriptor::new("cache", "Cache Warmer", "cache")
            .with_health_check_interval(Duration::from_millis(50));
        descriptor.runtime.status = ServiceStatus::Running;
        descriptor.runtime.restart_count = 2;

        let snapshot = Snapshot {
            services: vec![descriptor],
            health_checks: vec![HealthRecord::from_probe(
                "cache",
                Health::unhealthy("cold"),
                4,
            )],
            last_update: Utc::now(),
        };

        let json = snapshot.to_json().unwrap();
        let back = Snapshot::from_json(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.services[0].runtime.restart_count, 2);
        assert_eq!(back.health_checks[0].state, HealthState::Unhealthy);
    }

    #[test]
    fn test_wire_field_names() {
        let snapshot = Snapshot {
            services: vec![],
            health_checks: vec![],
            last_update: Utc::now(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert!(value.get("services").is_some());
        assert!(value.get("healthChecks").is_some());
        assert!(value.get("lastUpdate").is_some());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = Snapshot::from_json("{ not json").unwrap_err();
        assert_eq!(err.as_label(), "snapshot");
    }
}
