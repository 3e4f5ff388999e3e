//! # Service descriptor: identity, dependencies, settings, runtime state.
//!
//! [`ServiceDescriptor`] is the registry's unit of storage. It bundles:
//! - identity (`id`, `name`, `kind` — the opaque `type` tag),
//! - the declared dependency ids,
//! - [`ServiceSettings`] (operator intent: auto-start, restart cap, probe
//!   interval),
//! - [`ServiceRuntime`] (supervisor-owned state: status, timestamps,
//!   restart counter).
//!
//! Serde uses the snapshot wire names (`type`, `autoStart`,
//! `healthCheckIntervalMs`, `restartCount`, ...); durations serialize as
//! integer milliseconds, timestamps as RFC 3339.
//!
//! ## Rules
//! - `runtime` is mutated only by the controller and the restart policy
//!   engine, through registry methods. Registration resets it.
//! - A zero `health_check_interval` disables monitoring for the service.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current lifecycle state of a service.
///
/// Transitions are driven exclusively by the controller:
/// ```text
/// Stopped → Starting → Running → Stopping → Stopped
/// Running → Restarting → Starting (retry) | Stopped (cap exceeded)
/// any in-flight state → Failed on hook error
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceStatus {
    /// Not running; the initial state after registration.
    #[default]
    Stopped,
    /// The start hook is in flight.
    Starting,
    /// Started successfully; health monitoring may be armed.
    Running,
    /// The stop hook is in flight.
    Stopping,
    /// An automatic or manual restart is in flight.
    Restarting,
    /// A lifecycle hook failed; requires explicit intervention.
    Failed,
}

impl ServiceStatus {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::Starting => "starting",
            ServiceStatus::Running => "running",
            ServiceStatus::Stopping => "stopping",
            ServiceStatus::Restarting => "restarting",
            ServiceStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Operator-provided settings for one service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceSettings {
    /// Whether the service may be started at all.
    pub enabled: bool,
    /// Start immediately upon successful registration.
    pub auto_start: bool,
    /// Whether unhealthy probes trigger automatic restarts.
    pub restart_on_failure: bool,
    /// Automatic restart cap; past it the service is pinned to Stopped.
    pub max_restarts: u32,
    /// Probe period; `0` disables health monitoring.
    #[serde(rename = "healthCheckIntervalMs", with = "duration_ms")]
    pub health_check_interval: Duration,
}

impl ServiceSettings {
    /// Returns the probe interval as an `Option` (`0` → `None`).
    #[inline]
    pub fn health_interval_opt(&self) -> Option<Duration> {
        if self.health_check_interval == Duration::ZERO {
            None
        } else {
            Some(self.health_check_interval)
        }
    }
}

impl Default for ServiceSettings {
    /// Defaults: enabled, no auto-start, restart on failure with a cap of 3,
    /// monitoring disabled.
    fn default() -> Self {
        Self {
            enabled: true,
            auto_start: false,
            restart_on_failure: true,
            max_restarts: 3,
            health_check_interval: Duration::ZERO,
        }
    }
}

/// Supervisor-owned runtime state for one service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceRuntime {
    /// Current lifecycle state.
    pub status: ServiceStatus,
    /// When the service last reached Running.
    pub last_start: Option<DateTime<Utc>>,
    /// When the service last finished stopping.
    pub last_stop: Option<DateTime<Utc>>,
    /// Automatic restarts consumed against `max_restarts`.
    pub restart_count: u32,
}

/// Descriptor for one supervised service.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use servisor::ServiceDescriptor;
///
/// let desc = ServiceDescriptor::new("cache", "Cache Warmer", "cache")
///     .with_auto_start(true)
///     .with_max_restarts(2)
///     .with_health_check_interval(Duration::from_millis(50));
///
/// assert_eq!(desc.id, "cache");
/// assert!(desc.settings.auto_start);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Unique service id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Opaque classification tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Ids of services that must be Running before this one starts.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Operator settings.
    #[serde(default)]
    pub settings: ServiceSettings,
    /// Supervisor-owned state.
    #[serde(default)]
    pub runtime: ServiceRuntime,
}

impl ServiceDescriptor {
    /// Creates a descriptor with default settings and a fresh runtime.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            dependencies: Vec::new(),
            settings: ServiceSettings::default(),
            runtime: ServiceRuntime::default(),
        }
    }

    /// Adds one dependency id.
    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// Replaces the dependency list.
    pub fn with_dependencies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the settings wholesale.
    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets whether the service may be started.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.settings.enabled = enabled;
        self
    }

    /// Sets whether the service starts upon registration.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.settings.auto_start = auto_start;
        self
    }

    /// Sets whether unhealthy probes trigger automatic restarts.
    pub fn with_restart_on_failure(mut self, restart: bool) -> Self {
        self.settings.restart_on_failure = restart;
        self
    }

    /// Sets the automatic restart cap.
    pub fn with_max_restarts(mut self, max: u32) -> Self {
        self.settings.max_restarts = max;
        self
    }

    /// Sets the probe period (`0` disables monitoring).
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.settings.health_check_interval = interval;
        self
    }
}

/// Serializes a `Duration` as integer milliseconds (the wire convention).
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let desc = ServiceDescriptor::new("db", "Database", "storage");
        assert!(desc.settings.enabled);
        assert!(!desc.settings.auto_start);
        assert_eq!(desc.settings.max_restarts, 3);
        assert_eq!(desc.runtime.status, ServiceStatus::Stopped);
        assert_eq!(desc.runtime.restart_count, 0);
        assert!(desc.settings.health_interval_opt().is_none());
    }

    #[test]
    fn test_serde_wire_names() {
        let desc = ServiceDescriptor::new("api", "API Sync", "sync")
            .with_dependency("db")
            .with_health_check_interval(Duration::from_millis(250));

        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["type"], "sync");
        assert_eq!(json["settings"]["healthCheckIntervalMs"], 250);
        assert_eq!(json["settings"]["autoStart"], false);
        assert_eq!(json["runtime"]["restartCount"], 0);
        assert_eq!(json["runtime"]["status"], "stopped");

        let back: ServiceDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn test_settings_default_on_missing_fields() {
        let back: ServiceSettings = serde_json::from_str(r#"{"autoStart": true}"#).unwrap();
        assert!(back.auto_start);
        assert!(back.enabled);
        assert_eq!(back.max_restarts, 3);
    }
}
