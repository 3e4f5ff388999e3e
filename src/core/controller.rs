//! # LifecycleController: start/stop/restart orchestration.
//!
//! The controller drives the service state machine, walking dependencies in
//! resolver order, invoking hooks under the configured timeout, updating the
//! registry, and emitting one event per transition.
//!
//! ```text
//! start(id):
//!   ├─► start_order(id)                (resolver, deps before dependents)
//!   ├─► any dependency Failed?  ──► DependencyFailed (id untouched)
//!   ├─► ensure each dependency Running (already-Running deps no-op)
//!   ├─► lock(id): Starting → start() hook → Running  (+ arm probe)
//!   │                         └─ error → Failed, charge counter, re-throw
//! stop(id):
//!   └─► lock(id): disarm probe → Stopping → stop() hook → Stopped
//!                                           └─ error → Failed, re-throw
//! restart(id):
//!   └─► lock(id): Restarting → stop → charge counter → start → Restarted
//! ```
//!
//! ## Rules
//! - start/stop/restart on one id never run concurrently: a per-id async
//!   mutex makes late callers wait instead of racing state.
//! - At most one lock is held per dependency step, and locks are only ever
//!   acquired along DAG edges, so waits cannot cycle.
//! - The probe is disarmed (cancelled **and** joined) before the stop hook
//!   runs: no probe fires mid-shutdown.
//! - A policy-driven restart aborts silently if the service is no longer
//!   Running when its lock is acquired — stopping a service cancels a
//!   pending restart before the restart's start phase begins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time;

use crate::error::{HookError, SupervisorError};
use crate::events::{Bus, EventKind, EventRecorder, LifecycleEvent};
use crate::health::HealthMonitor;
use crate::services::ServiceStatus;

use super::registry::Registry;
use super::resolver;

/// Orchestrates lifecycle transitions for all registered services.
pub struct LifecycleController {
    registry: Arc<Registry>,
    monitor: Arc<HealthMonitor>,
    recorder: Arc<EventRecorder>,
    bus: Bus,
    hook_timeout: Option<Duration>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LifecycleController {
    pub(crate) fn new(
        registry: Arc<Registry>,
        monitor: Arc<HealthMonitor>,
        recorder: Arc<EventRecorder>,
        bus: Bus,
        hook_timeout: Option<Duration>,
    ) -> Self {
        Self {
            registry,
            monitor,
            recorder,
            bus,
            hook_timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Starts `id` after bringing every transitive dependency to Running.
    ///
    /// Idempotent for an already-Running service (the hook is not
    /// re-invoked). A direct call is operator intervention: the restart
    /// counter is cleared before starting.
    pub async fn start(&self, id: &str) -> Result<(), SupervisorError> {
        if self.registry.status(id).await? == ServiceStatus::Running {
            return Ok(());
        }
        self.start_dependencies(id).await?;

        let _guard = self.lock(id).await;
        if self.registry.status(id).await? == ServiceStatus::Running {
            return Ok(());
        }
        self.registry.reset_restarts(id).await?;
        self.start_locked(id, true).await
    }

    /// Stops `id`. The probe is cancelled before the stop hook runs.
    /// Stopping an already-Stopped service is a no-op.
    pub async fn stop(&self, id: &str) -> Result<(), SupervisorError> {
        let _guard = self.lock(id).await;
        self.stop_locked(id).await
    }

    /// Restarts `id`: stop, advance the restart counter, start.
    ///
    /// If the post-charge start fails, the service is Failed and the
    /// advanced counter is retained for future cap checks.
    pub async fn restart(&self, id: &str) -> Result<(), SupervisorError> {
        let _guard = self.lock(id).await;
        self.restart_locked(id).await
    }

    /// Policy-engine entry point: restart only if still Running.
    ///
    /// Returns `Ok(false)` when the restart was cancelled because a manual
    /// stop got there first.
    pub(crate) async fn restart_on_failure(&self, id: &str) -> Result<bool, SupervisorError> {
        let _guard = self.lock(id).await;
        if self.registry.status(id).await? != ServiceStatus::Running {
            return Ok(false);
        }
        self.restart_locked(id).await.map(|_| true)
    }

    /// Drops the per-id lock slot after deregistration.
    pub(crate) async fn forget(&self, id: &str) {
        self.locks.lock().await.remove(id);
    }

    // ---------------------------
    // Internals
    // ---------------------------

    /// Brings every transitive dependency of `id` to Running, dependencies
    /// before dependents. Fails fast if any of them is already Failed.
    async fn start_dependencies(&self, id: &str) -> Result<(), SupervisorError> {
        let graph = self.registry.graph().await;
        let order = resolver::start_order(id, &graph)?;

        for dep in &order {
            if let Ok(ServiceStatus::Failed) = self.registry.status(dep).await {
                return Err(SupervisorError::DependencyFailed {
                    service: id.to_string(),
                    dependency: dep.clone(),
                });
            }
        }
        for dep in &order {
            self.ensure_running(id, dep).await?;
        }
        Ok(())
    }

    /// Makes one dependency Running, or returns why it cannot be.
    ///
    /// Dependencies earlier in the start order are Running by the time this
    /// runs, so a plain locked start suffices — no recursion.
    async fn ensure_running(&self, dependent: &str, id: &str) -> Result<(), SupervisorError> {
        let _guard = self.lock(id).await;
        match self.registry.status(id).await? {
            ServiceStatus::Running => Ok(()),
            ServiceStatus::Failed => Err(SupervisorError::DependencyFailed {
                service: dependent.to_string(),
                dependency: id.to_string(),
            }),
            ServiceStatus::Stopped => self.start_locked(id, true).await,
            status => Err(SupervisorError::InvalidState {
                service: id.to_string(),
                reason: format!("cannot start dependency while {status}"),
            }),
        }
    }

    /// Runs the start transition for `id`. Caller holds the per-id lock.
    ///
    /// `charge_on_failure` advances the restart counter when the hook fails;
    /// the restart path passes `false` because it has already charged the
    /// attempt.
    async fn start_locked(
        &self,
        id: &str,
        charge_on_failure: bool,
    ) -> Result<(), SupervisorError> {
        let descriptor = self.registry.descriptor(id).await?;
        if !descriptor.settings.enabled {
            return Err(SupervisorError::InvalidState {
                service: id.to_string(),
                reason: "service is disabled".into(),
            });
        }
        if descriptor.runtime.status == ServiceStatus::Running {
            return Ok(());
        }
        for dep in &descriptor.dependencies {
            if self.registry.status(dep).await? != ServiceStatus::Running {
                return Err(SupervisorError::DependencyFailed {
                    service: id.to_string(),
                    dependency: dep.clone(),
                });
            }
        }

        self.registry.set_status(id, ServiceStatus::Starting).await?;
        self.emit(LifecycleEvent::new(EventKind::Starting).with_service(id)).await;

        let service = self.registry.service(id).await?;
        match self.run_hook(service.start()).await {
            Ok(()) => {
                self.registry.mark_started(id).await?;
                self.emit(LifecycleEvent::new(EventKind::Started).with_service(id)).await;
                if let Some(interval) = descriptor.settings.health_interval_opt() {
                    self.monitor.arm(id, interval, service).await;
                }
                tracing::debug!(service = %id, "service started");
                Ok(())
            }
            Err(err) => {
                self.registry.mark_failed(id, false).await?;
                if charge_on_failure {
                    let _ = self.registry.bump_restarts(id).await;
                }
                let reason = err.to_string();
                self.emit(
                    LifecycleEvent::new(EventKind::Failed)
                        .with_service(id)
                        .with_reason(reason.clone()),
                )
                .await;
                Err(SupervisorError::StartFailure {
                    service: id.to_string(),
                    reason,
                })
            }
        }
    }

    /// Runs the stop transition for `id`. Caller holds the per-id lock.
    async fn stop_locked(&self, id: &str) -> Result<(), SupervisorError> {
        if self.registry.status(id).await? == ServiceStatus::Stopped {
            return Ok(());
        }

        // Cancel and join the probe first so it cannot fire mid-shutdown.
        self.monitor.disarm(id).await;

        self.registry.set_status(id, ServiceStatus::Stopping).await?;
        self.emit(LifecycleEvent::new(EventKind::Stopping).with_service(id)).await;

        let service = self.registry.service(id).await?;
        match self.run_hook(service.stop()).await {
            Ok(()) => {
                self.registry.mark_stopped(id).await?;
                self.emit(LifecycleEvent::new(EventKind::Stopped).with_service(id)).await;
                tracing::debug!(service = %id, "service stopped");
                Ok(())
            }
            Err(err) => {
                self.registry.mark_failed(id, true).await?;
                let reason = err.to_string();
                self.emit(
                    LifecycleEvent::new(EventKind::Failed)
                        .with_service(id)
                        .with_reason(reason.clone()),
                )
                .await;
                Err(SupervisorError::StopFailure {
                    service: id.to_string(),
                    reason,
                })
            }
        }
    }

    /// Runs the restart cycle for `id`. Caller holds the per-id lock.
    async fn restart_locked(&self, id: &str) -> Result<(), SupervisorError> {
        self.registry.set_status(id, ServiceStatus::Restarting).await?;
        self.stop_locked(id).await?;
        let restarts = self.registry.bump_restarts(id).await?;
        self.start_locked(id, false).await?;
        self.emit(
            LifecycleEvent::new(EventKind::Restarted)
                .with_service(id)
                .with_restarts(restarts),
        )
        .await;
        Ok(())
    }

    /// Acquires the per-id operation lock, creating its slot on first use.
    async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        let cell = {
            let mut locks = self.locks.lock().await;
            Arc::clone(
                locks
                    .entry(id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        cell.lock_owned().await
    }

    /// Runs one lifecycle hook under the configured timeout.
    async fn run_hook<F>(&self, hook: F) -> Result<(), HookError>
    where
        F: Future<Output = Result<(), HookError>>,
    {
        match self.hook_timeout {
            Some(timeout) => match time::timeout(timeout, hook).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(HookError::Timeout { timeout }),
            },
            None => hook.await,
        }
    }

    /// Appends to the recorder, then broadcasts. The recorder write is
    /// synchronous with the transition; the bus is observability-only.
    async fn emit(&self, ev: LifecycleEvent) {
        self.recorder.record_event(ev.clone()).await;
        self.bus.publish(ev);
    }
}
