//! # RestartPolicyEngine: restart vs. permanent stop on unhealthy probes.
//!
//! The engine runs as a single listener task consuming [`ProbeReport`]s from
//! the monitor:
//!
//! ```text
//! probe task ──► ProbeReport{generation} ──► engine listener
//!                                              ├─ stale generation → drop
//!                                              ├─ restart_on_failure off → drop
//!                                              ├─ count < cap → controller.restart_on_failure()
//!                                              └─ cap reached → controller.stop()  (pinned Stopped)
//! ```
//!
//! Running the decisions on a dedicated task keeps restart work off the
//! probe tasks, so `disarm` can cancel and join a probe without deadlocking
//! on itself. Decisions are serialized: one automatic restart at a time.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::{LifecycleController, Registry};
use crate::services::ServiceStatus;

use super::monitor::{HealthMonitor, ProbeReport};

/// Decides the fate of services with unhealthy probes.
pub(crate) struct RestartPolicyEngine {
    registry: Arc<Registry>,
    controller: Arc<LifecycleController>,
    monitor: Arc<HealthMonitor>,
}

impl RestartPolicyEngine {
    pub(crate) fn new(
        registry: Arc<Registry>,
        controller: Arc<LifecycleController>,
        monitor: Arc<HealthMonitor>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            controller,
            monitor,
        })
    }

    /// Spawns the listener. It exits when every report sender is gone.
    pub(crate) fn spawn_listener(
        self: Arc<Self>,
        mut reports: mpsc::UnboundedReceiver<ProbeReport>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(report) = reports.recv().await {
                self.apply(report).await;
            }
        })
    }

    /// Applies the restart policy to one unhealthy report.
    async fn apply(&self, report: ProbeReport) {
        // Reports from a disarmed or re-armed probe are stale: the restart
        // or stop that retired that arming already handled the failure.
        if self.monitor.generation_of(&report.service).await != Some(report.generation) {
            return;
        }

        let Ok(descriptor) = self.registry.descriptor(&report.service).await else {
            return;
        };
        if !descriptor.settings.restart_on_failure {
            return;
        }
        if descriptor.runtime.status != ServiceStatus::Running {
            return;
        }

        let reason = report.record.details.as_deref().unwrap_or("unhealthy probe");
        if descriptor.runtime.restart_count < descriptor.settings.max_restarts {
            tracing::warn!(
                service = %report.service,
                restarts = descriptor.runtime.restart_count,
                max_restarts = descriptor.settings.max_restarts,
                reason,
                "unhealthy probe, restarting"
            );
            match self.controller.restart_on_failure(&report.service).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(
                        service = %report.service,
                        "pending restart cancelled, service no longer running"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        service = %report.service,
                        error = %err,
                        "automatic restart failed"
                    );
                }
            }
        } else {
            tracing::warn!(
                service = %report.service,
                restarts = descriptor.runtime.restart_count,
                reason,
                "restart cap reached, stopping permanently"
            );
            if let Err(err) = self.controller.stop(&report.service).await {
                tracing::warn!(
                    service = %report.service,
                    error = %err,
                    "stop after restart cap failed"
                );
            }
        }
    }
}
