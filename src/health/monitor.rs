//! # HealthMonitor: per-service repeating probe tasks.
//!
//! While a service is Running and has a nonzero probe interval, the monitor
//! owns one repeating task for it:
//!
//! ```text
//! arm(id) ──► probe task (generation N)
//!               loop {
//!                 ├─► wait interval        (cancellable)
//!                 ├─► service.check_health() under hook timeout
//!                 ├─► stamp HealthRecord, append to recorder
//!                 └─► Unhealthy → send ProbeReport{generation} to policy
//!               }
//! disarm(id) ──► cancel token, join task   (before the stop hook runs)
//! ```
//!
//! ## Rules
//! - A thrown or timed-out probe is downgraded to an `Unhealthy` record; it
//!   never propagates and never stops future ticks.
//! - Each arming gets a fresh generation number. Reports carry it so the
//!   policy engine can reject reports from a probe that has since been
//!   disarmed (e.g. one queued just before a restart).
//! - `disarm` cancels and joins: once it returns, no further record for that
//!   arming will be produced.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::HookError;
use crate::events::EventRecorder;
use crate::services::ServiceRef;

use super::record::{HealthRecord, HealthState};

/// An Unhealthy probe outcome handed to the restart policy engine.
pub(crate) struct ProbeReport {
    /// The probed service.
    pub service: String,
    /// The record that was appended.
    pub record: HealthRecord,
    /// Generation of the arming that produced the record.
    pub generation: u64,
}

/// Handle to one armed probe task.
struct ProbeHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
    generation: u64,
}

/// Owns the repeating probe tasks, one per monitored Running service.
pub struct HealthMonitor {
    probes: RwLock<HashMap<String, ProbeHandle>>,
    reports: mpsc::UnboundedSender<ProbeReport>,
    recorder: Arc<EventRecorder>,
    hook_timeout: Option<Duration>,
    generations: AtomicU64,
}

impl HealthMonitor {
    /// Creates the monitor and the report channel consumed by the policy
    /// engine listener.
    pub(crate) fn new(
        recorder: Arc<EventRecorder>,
        hook_timeout: Option<Duration>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ProbeReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = Arc::new(Self {
            probes: RwLock::new(HashMap::new()),
            reports: tx,
            recorder,
            hook_timeout,
            generations: AtomicU64::new(0),
        });
        (monitor, rx)
    }

    /// Arms (or re-arms) the repeating probe for `service`.
    ///
    /// Any previous arming for the same id is disarmed first, so at most one
    /// probe task exists per service.
    pub(crate) async fn arm(&self, service: &str, interval: Duration, hooks: ServiceRef) {
        self.disarm(service).await;

        let generation = self.generations.fetch_add(1, AtomicOrdering::Relaxed) + 1;
        let cancel = CancellationToken::new();
        let join = tokio::spawn(probe_loop(ProbeLoop {
            service: service.to_string(),
            interval,
            hooks,
            recorder: Arc::clone(&self.recorder),
            reports: self.reports.clone(),
            hook_timeout: self.hook_timeout,
            cancel: cancel.clone(),
            generation,
        }));

        self.probes.write().await.insert(
            service.to_string(),
            ProbeHandle {
                cancel,
                join,
                generation,
            },
        );
    }

    /// Cancels and joins the probe task for `service`, if armed.
    ///
    /// Returns only after the task has exited; no record from this arming is
    /// produced afterwards.
    pub(crate) async fn disarm(&self, service: &str) {
        let handle = self.probes.write().await.remove(service);
        if let Some(handle) = handle {
            handle.cancel.cancel();
            let _ = handle.join.await;
        }
    }

    /// Disarms every probe (shutdown, snapshot import).
    pub(crate) async fn disarm_all(&self) {
        let handles: Vec<ProbeHandle> = {
            let mut probes = self.probes.write().await;
            probes.drain().map(|(_, h)| h).collect()
        };
        for handle in &handles {
            handle.cancel.cancel();
        }
        for handle in handles {
            let _ = handle.join.await;
        }
    }

    /// Returns true if a probe task is currently armed for `service`.
    pub async fn is_armed(&self, service: &str) -> bool {
        self.probes.read().await.contains_key(service)
    }

    /// Returns the generation of the current arming, if any.
    pub(crate) async fn generation_of(&self, service: &str) -> Option<u64> {
        self.probes.read().await.get(service).map(|h| h.generation)
    }
}

struct ProbeLoop {
    service: String,
    interval: Duration,
    hooks: ServiceRef,
    recorder: Arc<EventRecorder>,
    reports: mpsc::UnboundedSender<ProbeReport>,
    hook_timeout: Option<Duration>,
    cancel: CancellationToken,
    generation: u64,
}

/// Body of one probe task. First tick fires one interval after arming.
async fn probe_loop(ctx: ProbeLoop) {
    let mut ticker = time::interval_at(Instant::now() + ctx.interval, ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        let probe = run_probe(&ctx.hooks, ctx.hook_timeout);
        let outcome = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            outcome = probe => outcome,
        };
        let elapsed_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;

        let record = match outcome {
            Ok(health) => HealthRecord::from_probe(&ctx.service, health, elapsed_ms),
            Err(err) => {
                tracing::debug!(
                    service = %ctx.service,
                    error = %err,
                    "health probe failed, recording as unhealthy"
                );
                HealthRecord::probe_failure(&ctx.service, err.to_string(), elapsed_ms)
            }
        };

        let unhealthy = record.state == HealthState::Unhealthy;
        ctx.recorder.record_health(record.clone()).await;
        if unhealthy {
            let _ = ctx.reports.send(ProbeReport {
                service: ctx.service.clone(),
                record,
                generation: ctx.generation,
            });
        }
    }
}

/// Runs one `check_health` invocation under the hook timeout.
async fn run_probe(
    hooks: &ServiceRef,
    hook_timeout: Option<Duration>,
) -> Result<super::Health, HookError> {
    match hook_timeout {
        Some(timeout) => match time::timeout(timeout, hooks.check_health()).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(HookError::Timeout { timeout }),
        },
        None => hooks.check_health().await,
    }
}
