//! # Health data model.
//!
//! A probe hook reports a [`Health`] — state plus resource gauges. The
//! monitor stamps it into a [`HealthRecord`] with the service id, a
//! wall-clock timestamp, and the measured probe round-trip time, then
//! appends it to the recorder. Records are immutable once created and
//! ordered by timestamp per service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome classification of one health probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HealthState {
    /// The service is operating normally.
    Healthy,
    /// The service works but with reduced capacity; recorded for
    /// observability only, never triggers restart policy.
    Degraded,
    /// The service is not functioning; feeds the restart policy engine.
    Unhealthy,
}

impl HealthState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// Resource gauges attached to a health record.
///
/// `cpu` and `memory` come from the probe hook; `response_time_ms` is the
/// probe round-trip measured by the monitor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    /// CPU usage gauge (hook-defined scale).
    pub cpu: f64,
    /// Memory usage gauge (hook-defined scale).
    pub memory: f64,
    /// Probe round-trip time in milliseconds, measured by the monitor.
    pub response_time_ms: u64,
}

/// What a probe hook reports back to the monitor.
///
/// ## Example
/// ```
/// use servisor::{Health, HealthState};
///
/// let h = Health::unhealthy("queue depth over limit");
/// assert_eq!(h.state, HealthState::Unhealthy);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Health {
    /// Probe outcome.
    pub state: HealthState,
    /// CPU usage gauge.
    pub cpu: f64,
    /// Memory usage gauge.
    pub memory: f64,
    /// Optional human-readable detail.
    pub details: Option<String>,
}

impl Health {
    fn new(state: HealthState) -> Self {
        Self {
            state,
            cpu: 0.0,
            memory: 0.0,
            details: None,
        }
    }

    /// A healthy report with zero gauges.
    pub fn healthy() -> Self {
        Self::new(HealthState::Healthy)
    }

    /// A degraded report with a detail message.
    pub fn degraded(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(HealthState::Degraded)
        }
    }

    /// An unhealthy report with a detail message.
    pub fn unhealthy(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(HealthState::Unhealthy)
        }
    }

    /// Attaches a CPU gauge.
    pub fn with_cpu(mut self, cpu: f64) -> Self {
        self.cpu = cpu;
        self
    }

    /// Attaches a memory gauge.
    pub fn with_memory(mut self, memory: f64) -> Self {
        self.memory = memory;
        self
    }
}

/// One immutable probe outcome for one service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    /// The probed service.
    #[serde(rename = "serviceId")]
    pub service: String,
    /// When the probe completed.
    #[serde(rename = "timestamp")]
    pub at: DateTime<Utc>,
    /// Probe outcome.
    #[serde(rename = "status")]
    pub state: HealthState,
    /// Resource gauges.
    pub metrics: HealthMetrics,
    /// Optional detail (probe message, or the error text of a failed probe).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HealthRecord {
    /// Stamps a hook-reported [`Health`] into a record.
    pub(crate) fn from_probe(service: &str, health: Health, response_time_ms: u64) -> Self {
        Self {
            service: service.to_string(),
            at: Utc::now(),
            state: health.state,
            metrics: HealthMetrics {
                cpu: health.cpu,
                memory: health.memory,
                response_time_ms,
            },
            details: health.details,
        }
    }

    /// Builds the Unhealthy record for a probe that threw or timed out.
    pub(crate) fn probe_failure(service: &str, reason: String, response_time_ms: u64) -> Self {
        Self {
            service: service.to_string(),
            at: Utc::now(),
            state: HealthState::Unhealthy,
            metrics: HealthMetrics {
                cpu: 0.0,
                memory: 0.0,
                response_time_ms,
            },
            details: Some(reason),
        }
    }
}
