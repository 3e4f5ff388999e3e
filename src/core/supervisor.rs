//! # Supervisor: the facade owning every component.
//!
//! One explicitly constructed instance per process, owned by the
//! application's composition root and passed by reference to callers —
//! there is no ambient global state.
//!
//! ## High-level architecture
//! ```text
//!   register(spec) ──► Registry (validate + store) ──► Registered event
//!        │                                   └─ auto_start → Controller.start
//!        ▼
//!   Controller ──► start/stop/restart ──► hooks (under timeout)
//!        │              │
//!        │              └─► HealthMonitor.arm / disarm (probe tasks)
//!        │                        │
//!        │                        └─► Unhealthy ──► RestartPolicyEngine
//!        │                                               └─► Controller
//!        └─► every transition ──► EventRecorder (sync) + Bus ──► Subscribers
//!
//!   export_snapshot / import_snapshot ──► Snapshot {services, healthChecks}
//! ```

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use crate::events::{Bus, EventKind, EventRecorder, LifecycleEvent};
use crate::health::{HealthMonitor, HealthRecord};
use crate::services::{ServiceDescriptor, ServiceSpec, ServiceStatus};
use crate::snapshot::Snapshot;
use crate::subscribers::SubscriberSet;

use super::controller::LifecycleController;
use super::registry::Registry;
use super::resolver::{self, Graph};

/// Coordinates the registry, lifecycle controller, health monitoring,
/// restart policy, and observability surfaces.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    registry: Arc<Registry>,
    recorder: Arc<EventRecorder>,
    monitor: Arc<HealthMonitor>,
    controller: Arc<LifecycleController>,
    _subs: Arc<SubscriberSet>,
    _policy_listener: JoinHandle<()>,
    _subscriber_listener: Option<JoinHandle<()>>,
}

impl Supervisor {
    /// Returns a builder for the given configuration.
    pub fn builder(cfg: SupervisorConfig) -> super::builder::SupervisorBuilder {
        super::builder::SupervisorBuilder::new(cfg)
    }

    /// Builds a supervisor with no subscribers.
    ///
    /// Must be called within a Tokio runtime (listener tasks are spawned).
    pub fn new(cfg: SupervisorConfig) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        bus: Bus,
        registry: Arc<Registry>,
        recorder: Arc<EventRecorder>,
        monitor: Arc<HealthMonitor>,
        controller: Arc<LifecycleController>,
        subs: Arc<SubscriberSet>,
        policy_listener: JoinHandle<()>,
        subscriber_listener: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            cfg,
            bus,
            registry,
            recorder,
            monitor,
            controller,
            _subs: subs,
            _policy_listener: policy_listener,
            _subscriber_listener: subscriber_listener,
        }
    }

    /// Returns the configuration the supervisor was built with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    // ---------------------------
    // Registration
    // ---------------------------

    /// Validates and stores a service, emitting `Registered`.
    ///
    /// Registration is atomic: on `Validation` or `CyclicDependency` errors
    /// the registry is left unchanged. When `settings.auto_start` is set the
    /// service is started before this returns; a start failure is returned
    /// to the caller, but the service stays registered (status Failed).
    pub async fn register(&self, spec: ServiceSpec) -> Result<(), SupervisorError> {
        let descriptor = self.registry.insert(spec).await?;
        self.emit(LifecycleEvent::new(EventKind::Registered).with_service(descriptor.id.clone()))
            .await;
        tracing::debug!(service = %descriptor.id, kind = %descriptor.kind, "service registered");

        if descriptor.settings.enabled && descriptor.settings.auto_start {
            self.controller.start(&descriptor.id).await?;
        }
        Ok(())
    }

    /// Removes a service. Requires Stopped or Failed (stop it first).
    pub async fn deregister(&self, id: &str) -> Result<(), SupervisorError> {
        self.registry.remove(id).await?;
        self.controller.forget(id).await;
        self.emit(LifecycleEvent::new(EventKind::Deregistered).with_service(id)).await;
        tracing::debug!(service = %id, "service deregistered");
        Ok(())
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Starts a service after its transitive dependencies are Running.
    ///
    /// No-op when already Running. A direct call is operator intervention
    /// and clears the restart counter.
    pub async fn start(&self, id: &str) -> Result<(), SupervisorError> {
        self.controller.start(id).await
    }

    /// Stops a service, cancelling its health probe first.
    pub async fn stop(&self, id: &str) -> Result<(), SupervisorError> {
        self.controller.stop(id).await
    }

    /// Restarts a service: stop, advance the restart counter, start.
    pub async fn restart(&self, id: &str) -> Result<(), SupervisorError> {
        self.controller.restart(id).await
    }

    /// Stops every non-Stopped service, dependents before dependencies,
    /// and disarms all probes. Individual stop failures are logged, not
    /// propagated.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        let graph = self.registry.graph().await;
        let order = resolver::shutdown_order(&graph)?;
        for id in order {
            match self.registry.status(&id).await {
                Ok(ServiceStatus::Stopped) | Err(_) => {}
                Ok(_) => {
                    if let Err(err) = self.controller.stop(&id).await {
                        tracing::warn!(service = %id, error = %err, "stop during shutdown failed");
                    }
                }
            }
        }
        self.monitor.disarm_all().await;
        Ok(())
    }

    // ---------------------------
    // Queries
    // ---------------------------

    /// Returns a copy of the descriptor.
    pub async fn descriptor(&self, id: &str) -> Result<ServiceDescriptor, SupervisorError> {
        self.registry.descriptor(id).await
    }

    /// Returns the current status.
    pub async fn status(&self, id: &str) -> Result<ServiceStatus, SupervisorError> {
        self.registry.status(id).await
    }

    /// Returns every descriptor, sorted by id.
    pub async fn list(&self) -> Vec<ServiceDescriptor> {
        self.registry.list().await
    }

    /// Returns the descriptors currently in `status`, sorted by id.
    pub async fn list_by_status(&self, status: ServiceStatus) -> Vec<ServiceDescriptor> {
        self.registry.list_by_status(status).await
    }

    /// Returns the declared dependency graph (id → dependency ids).
    pub async fn dependency_graph(&self) -> Graph {
        self.registry.graph().await
    }

    /// Returns every recorded lifecycle event, in emission order.
    pub async fn events(&self) -> Vec<LifecycleEvent> {
        self.recorder.events().await
    }

    /// Returns the lifecycle events for one service, in emission order.
    pub async fn events_for(&self, id: &str) -> Vec<LifecycleEvent> {
        self.recorder.events_for(id).await
    }

    /// Returns the health history for one service, oldest first.
    pub async fn health_history(&self, id: &str) -> Vec<HealthRecord> {
        self.recorder.health_for(id).await
    }

    /// Returns true if a health probe is currently armed for the service.
    pub async fn probe_armed(&self, id: &str) -> bool {
        self.monitor.is_armed(id).await
    }

    /// Creates a new receiver observing subsequent lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.bus.subscribe()
    }

    // ---------------------------
    // Persistence
    // ---------------------------

    /// Captures the full supervisor state: every descriptor (runtime
    /// included) plus the retained health history.
    pub async fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            services: self.registry.list().await,
            health_checks: self.recorder.all_health().await,
            last_update: Utc::now(),
        }
    }

    /// Restores supervisor state from a snapshot.
    ///
    /// Hooks cannot be serialized, so every snapshot id must already be
    /// registered here (same-binary recovery); otherwise `NotFound` is
    /// returned and nothing changes. On success, descriptors — status and
    /// restart counters exactly as captured — and the health history are
    /// replaced wholesale, and monitoring is re-armed for every restored
    /// Running service with a nonzero probe interval **without** invoking
    /// start hooks.
    pub async fn import_snapshot(&self, snapshot: Snapshot) -> Result<(), SupervisorError> {
        self.registry.replace_all(snapshot.services.clone()).await?;
        self.monitor.disarm_all().await;
        self.recorder.replace_health(snapshot.health_checks).await;

        for descriptor in &snapshot.services {
            if descriptor.runtime.status != ServiceStatus::Running {
                continue;
            }
            if let Some(interval) = descriptor.settings.health_interval_opt() {
                let service = self.registry.service(&descriptor.id).await?;
                self.monitor.arm(&descriptor.id, interval, service).await;
            }
        }
        tracing::debug!(services = snapshot.services.len(), "snapshot imported");
        Ok(())
    }

    async fn emit(&self, ev: LifecycleEvent) {
        self.recorder.record_event(ev.clone()).await;
        self.bus.publish(ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::future::Future;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time;

    use crate::error::HookError;
    use crate::health::{Health, HealthState};
    use crate::services::{Service, ServiceFn, ServiceRef};

    /// Shared, ordered log of hook invocations across services.
    #[derive(Default)]
    struct CallLog {
        calls: StdMutex<Vec<String>>,
    }

    impl CallLog {
        fn push(&self, entry: impl Into<String>) {
            self.calls.lock().unwrap().push(entry.into());
        }

        fn snapshot(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[derive(Clone, Copy)]
    enum HealthMode {
        Healthy,
        Degraded,
        Unhealthy,
        /// The probe hook itself errors.
        Broken,
    }

    /// Scriptable counting service used by the scenario tests.
    struct TestService {
        id: String,
        log: Arc<CallLog>,
        starts: AtomicUsize,
        stops: AtomicUsize,
        fail_start: AtomicBool,
        fail_stop: AtomicBool,
        health_mode: StdMutex<HealthMode>,
    }

    impl TestService {
        fn new(id: &str, log: &Arc<CallLog>) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                log: Arc::clone(log),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
                fail_start: AtomicBool::new(false),
                fail_stop: AtomicBool::new(false),
                health_mode: StdMutex::new(HealthMode::Healthy),
            })
        }

        fn starts(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }

        fn stops(&self) -> usize {
            self.stops.load(Ordering::SeqCst)
        }

        fn set_health(&self, mode: HealthMode) {
            *self.health_mode.lock().unwrap() = mode;
        }
    }

    #[async_trait]
    impl Service for TestService {
        async fn start(&self) -> Result<(), HookError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.log.push(format!("start:{}", self.id));
            if self.fail_start.load(Ordering::SeqCst) {
                Err(HookError::fail("start refused"))
            } else {
                Ok(())
            }
        }

        async fn stop(&self) -> Result<(), HookError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.log.push(format!("stop:{}", self.id));
            if self.fail_stop.load(Ordering::SeqCst) {
                Err(HookError::fail("stop refused"))
            } else {
                Ok(())
            }
        }

        async fn check_health(&self) -> Result<Health, HookError> {
            match *self.health_mode.lock().unwrap() {
                HealthMode::Healthy => Ok(Health::healthy()),
                HealthMode::Degraded => Ok(Health::degraded("reduced capacity")),
                HealthMode::Unhealthy => Ok(Health::unhealthy("overloaded")),
                HealthMode::Broken => Err(HookError::fail("probe exploded")),
            }
        }
    }

    fn spec(descriptor: ServiceDescriptor, svc: &Arc<TestService>) -> ServiceSpec {
        let hooks: ServiceRef = svc.clone();
        ServiceSpec::new(descriptor, hooks)
    }

    fn descriptor(id: &str) -> ServiceDescriptor {
        ServiceDescriptor::new(id, id.to_uppercase(), "test")
    }

    /// Polls `cond` under paused time until it holds (or the deadline hits).
    async fn eventually<F, Fut>(mut cond: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        for _ in 0..400 {
            if cond().await {
                return true;
            }
            time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_auto_start_in_dependency_order() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);
        let api = TestService::new("api", &log);

        sup.register(spec(descriptor("cache").with_auto_start(true), &cache))
            .await
            .unwrap();
        sup.register(spec(
            descriptor("api").with_dependency("cache").with_auto_start(true),
            &api,
        ))
        .await
        .unwrap();

        assert_eq!(sup.status("cache").await.unwrap(), ServiceStatus::Running);
        assert_eq!(sup.status("api").await.unwrap(), ServiceStatus::Running);
        assert_eq!(log.snapshot(), vec!["start:cache", "start:api"]);
    }

    #[tokio::test]
    async fn test_start_walks_transitive_dependencies() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let db = TestService::new("db", &log);
        let worker = TestService::new("worker", &log);
        let app = TestService::new("app", &log);

        sup.register(spec(descriptor("db"), &db)).await.unwrap();
        sup.register(spec(descriptor("worker").with_dependency("db"), &worker))
            .await
            .unwrap();
        sup.register(spec(descriptor("app").with_dependency("worker"), &app))
            .await
            .unwrap();

        sup.start("app").await.unwrap();

        assert_eq!(log.snapshot(), vec!["start:db", "start:worker", "start:app"]);
        for id in ["db", "worker", "app"] {
            assert_eq!(sup.status(id).await.unwrap(), ServiceStatus::Running);
        }
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);

        sup.register(spec(descriptor("cache"), &cache)).await.unwrap();
        sup.start("cache").await.unwrap();
        sup.start("cache").await.unwrap();

        assert_eq!(cache.starts(), 1);
        let desc = sup.descriptor("cache").await.unwrap();
        assert_eq!(desc.runtime.restart_count, 0);
    }

    #[tokio::test]
    async fn test_start_unknown_service() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let err = sup.start("ghost").await.unwrap_err();
        assert_eq!(err.as_label(), "not_found");
    }

    #[tokio::test]
    async fn test_disabled_service_refuses_start() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);

        sup.register(spec(descriptor("cache").with_enabled(false), &cache))
            .await
            .unwrap();
        let err = sup.start("cache").await.unwrap_err();
        assert_eq!(err.as_label(), "invalid_state");
        assert_eq!(cache.starts(), 0);
    }

    #[tokio::test]
    async fn test_failed_dependency_fails_fast() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let db = TestService::new("db", &log);
        let api = TestService::new("api", &log);
        db.fail_start.store(true, Ordering::SeqCst);

        sup.register(spec(descriptor("db"), &db)).await.unwrap();
        sup.register(spec(descriptor("api").with_dependency("db"), &api))
            .await
            .unwrap();

        let err = sup.start("db").await.unwrap_err();
        assert_eq!(err.as_label(), "start_failure");
        assert_eq!(sup.status("db").await.unwrap(), ServiceStatus::Failed);
        // a failed start hook consumes one attempt under the unified counter
        assert_eq!(sup.descriptor("db").await.unwrap().runtime.restart_count, 1);

        let err = sup.start("api").await.unwrap_err();
        assert_eq!(err.as_label(), "dependency_failed");
        assert_eq!(sup.status("api").await.unwrap(), ServiceStatus::Stopped);
        assert_eq!(api.starts(), 0);
    }

    #[tokio::test]
    async fn test_start_hook_failure_records_failed_event() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let relay = TestService::new("relay", &log);
        relay.fail_start.store(true, Ordering::SeqCst);

        sup.register(spec(descriptor("relay"), &relay)).await.unwrap();
        sup.start("relay").await.unwrap_err();

        let kinds: Vec<EventKind> = sup
            .events_for("relay")
            .await
            .iter()
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::Registered, EventKind::Starting, EventKind::Failed]
        );
        let events = sup.events_for("relay").await;
        assert_eq!(events[2].reason.as_deref(), Some("start refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_hook_timeout_counts_as_failure() {
        let sup = Supervisor::new(SupervisorConfig {
            hook_timeout: Duration::from_millis(50),
            ..SupervisorConfig::default()
        });
        let slow = ServiceFn::new()
            .on_start(|| async {
                time::sleep(Duration::from_millis(500)).await;
                Ok(())
            })
            .arc();

        sup.register(ServiceSpec::new(descriptor("slow"), slow))
            .await
            .unwrap();
        let err = sup.start("slow").await.unwrap_err();
        assert_eq!(err.as_label(), "start_failure");
        assert!(err.to_string().contains("timed out"));
        assert_eq!(sup.status("slow").await.unwrap(), ServiceStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_ops_are_mutually_exclusive() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let start_log = Arc::clone(&log);
        let stop_log = Arc::clone(&log);
        let slow = ServiceFn::new()
            .on_start(move || {
                let log = Arc::clone(&start_log);
                async move {
                    log.push("start:slow");
                    time::sleep(Duration::from_millis(100)).await;
                    Ok(())
                }
            })
            .on_stop(move || {
                let log = Arc::clone(&stop_log);
                async move {
                    log.push("stop:slow");
                    Ok(())
                }
            })
            .arc();

        sup.register(ServiceSpec::new(descriptor("slow"), slow))
            .await
            .unwrap();

        let starter = {
            let sup = Arc::clone(&sup);
            tokio::spawn(async move { sup.start("slow").await })
        };
        time::sleep(Duration::from_millis(10)).await;
        // the stop must wait for the in-flight start, not race it
        sup.stop("slow").await.unwrap();
        starter.await.unwrap().unwrap();

        assert_eq!(log.snapshot(), vec!["start:slow", "stop:slow"]);
        assert_eq!(sup.status("slow").await.unwrap(), ServiceStatus::Stopped);
    }

    #[tokio::test]
    async fn test_event_log_covers_full_cycle() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);

        sup.register(spec(descriptor("cache"), &cache)).await.unwrap();
        sup.start("cache").await.unwrap();
        sup.stop("cache").await.unwrap();

        let events = sup.events_for("cache").await;
        let kinds: Vec<EventKind> = events.iter().map(|ev| ev.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Registered,
                EventKind::Starting,
                EventKind::Started,
                EventKind::Stopping,
                EventKind::Stopped,
            ]
        );
        assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));

        let desc = sup.descriptor("cache").await.unwrap();
        assert!(desc.runtime.last_start.is_some());
        assert!(desc.runtime.last_stop.is_some());
    }

    #[tokio::test]
    async fn test_manual_restart_advances_counter() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);

        sup.register(spec(descriptor("cache"), &cache)).await.unwrap();
        sup.start("cache").await.unwrap();
        sup.restart("cache").await.unwrap();

        assert_eq!(cache.starts(), 2);
        assert_eq!(cache.stops(), 1);
        let desc = sup.descriptor("cache").await.unwrap();
        assert_eq!(desc.runtime.status, ServiceStatus::Running);
        assert_eq!(desc.runtime.restart_count, 1);

        let restarted: Vec<LifecycleEvent> = sup
            .events_for("cache")
            .await
            .into_iter()
            .filter(|ev| ev.kind == EventKind::Restarted)
            .collect();
        assert_eq!(restarted.len(), 1);
        assert_eq!(restarted[0].restarts, Some(1));
    }

    #[tokio::test]
    async fn test_stop_hook_failure_pins_failed() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);
        cache.fail_stop.store(true, Ordering::SeqCst);

        sup.register(spec(descriptor("cache"), &cache)).await.unwrap();
        sup.start("cache").await.unwrap();

        let err = sup.stop("cache").await.unwrap_err();
        assert_eq!(err.as_label(), "stop_failure");
        let desc = sup.descriptor("cache").await.unwrap();
        assert_eq!(desc.runtime.status, ServiceStatus::Failed);
        // the stop attempt is still part of the bookkeeping
        assert!(desc.runtime.last_stop.is_some());

        // Failed services may be deregistered without a further stop
        sup.deregister("cache").await.unwrap();
        assert!(matches!(
            sup.status("cache").await,
            Err(SupervisorError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deregister_requires_stopped() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);

        sup.register(spec(descriptor("cache"), &cache)).await.unwrap();
        sup.start("cache").await.unwrap();

        let err = sup.deregister("cache").await.unwrap_err();
        assert_eq!(err.as_label(), "invalid_state");

        sup.stop("cache").await.unwrap();
        sup.deregister("cache").await.unwrap();

        let err = sup.deregister("cache").await.unwrap_err();
        assert_eq!(err.as_label(), "not_found");
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cap_pins_service_stopped() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);
        cache.set_health(HealthMode::Unhealthy);

        sup.register(spec(
            descriptor("cache")
                .with_restart_on_failure(true)
                .with_max_restarts(2)
                .with_health_check_interval(Duration::from_millis(50)),
            &cache,
        ))
        .await
        .unwrap();
        sup.start("cache").await.unwrap();
        assert_eq!(cache.starts(), 1);

        // terminal state: the initial start plus one start per consumed
        // restart, then pinned Stopped (a bare Stopped check could catch the
        // transient stop inside a restart cycle)
        let settled = eventually(|| {
            let sup = Arc::clone(&sup);
            let cache = Arc::clone(&cache);
            async move {
                cache.starts() == 3
                    && sup.status("cache").await.unwrap() == ServiceStatus::Stopped
            }
        })
        .await;
        assert!(settled, "service never reached the permanent stop");

        let desc = sup.descriptor("cache").await.unwrap();
        assert_eq!(desc.runtime.restart_count, 2);
        assert!(!sup.probe_armed("cache").await);

        // no later probe can revive it: nothing is armed, nothing restarts
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(cache.starts(), 3);
        assert_eq!(sup.status("cache").await.unwrap(), ServiceStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_start_resets_counter_after_cap() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);
        cache.set_health(HealthMode::Unhealthy);

        sup.register(spec(
            descriptor("cache")
                .with_max_restarts(1)
                .with_health_check_interval(Duration::from_millis(50)),
            &cache,
        ))
        .await
        .unwrap();
        sup.start("cache").await.unwrap();

        let settled = eventually(|| {
            let sup = Arc::clone(&sup);
            let cache = Arc::clone(&cache);
            async move {
                cache.starts() == 2
                    && sup.status("cache").await.unwrap() == ServiceStatus::Stopped
            }
        })
        .await;
        assert!(settled);
        assert_eq!(sup.descriptor("cache").await.unwrap().runtime.restart_count, 1);

        // operator intervention: fix the service, start it again
        cache.set_health(HealthMode::Healthy);
        sup.start("cache").await.unwrap();

        let desc = sup.descriptor("cache").await.unwrap();
        assert_eq!(desc.runtime.status, ServiceStatus::Running);
        assert_eq!(desc.runtime.restart_count, 0);
        assert!(sup.probe_armed("cache").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_probe() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);

        sup.register(spec(
            descriptor("cache").with_health_check_interval(Duration::from_millis(20)),
            &cache,
        ))
        .await
        .unwrap();
        sup.start("cache").await.unwrap();
        assert!(sup.probe_armed("cache").await);

        let recorded = eventually(|| {
            let sup = Arc::clone(&sup);
            async move { !sup.health_history("cache").await.is_empty() }
        })
        .await;
        assert!(recorded);

        sup.stop("cache").await.unwrap();
        assert!(!sup.probe_armed("cache").await);

        let frozen = sup.health_history("cache").await.len();
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sup.health_history("cache").await.len(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_recorded_not_fatal() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);
        cache.set_health(HealthMode::Broken);

        sup.register(spec(
            descriptor("cache")
                .with_restart_on_failure(false)
                .with_health_check_interval(Duration::from_millis(20)),
            &cache,
        ))
        .await
        .unwrap();
        sup.start("cache").await.unwrap();

        let kept_ticking = eventually(|| {
            let sup = Arc::clone(&sup);
            async move { sup.health_history("cache").await.len() >= 3 }
        })
        .await;
        assert!(kept_ticking, "a failed probe must not stop future ticks");

        for record in sup.health_history("cache").await {
            assert_eq!(record.state, HealthState::Unhealthy);
            assert_eq!(record.details.as_deref(), Some("probe exploded"));
        }
        // restart_on_failure=false: recorded, never acted on
        assert_eq!(cache.starts(), 1);
        assert_eq!(sup.status("cache").await.unwrap(), ServiceStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_does_not_trigger_policy() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);
        cache.set_health(HealthMode::Degraded);

        sup.register(spec(
            descriptor("cache")
                .with_max_restarts(5)
                .with_health_check_interval(Duration::from_millis(20)),
            &cache,
        ))
        .await
        .unwrap();
        sup.start("cache").await.unwrap();

        let recorded = eventually(|| {
            let sup = Arc::clone(&sup);
            async move { sup.health_history("cache").await.len() >= 3 }
        })
        .await;
        assert!(recorded);

        assert_eq!(cache.starts(), 1);
        assert_eq!(sup.status("cache").await.unwrap(), ServiceStatus::Running);
        assert!(
            sup.health_history("cache")
                .await
                .iter()
                .all(|r| r.state == HealthState::Degraded)
        );
    }

    #[tokio::test]
    async fn test_pending_restart_cancelled_by_stop() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);

        sup.register(spec(descriptor("cache"), &cache)).await.unwrap();
        sup.start("cache").await.unwrap();
        sup.stop("cache").await.unwrap();

        // the queued policy restart finds the service stopped and aborts
        // before the start phase
        let resumed = sup.controller.restart_on_failure("cache").await.unwrap();
        assert!(!resumed);
        assert_eq!(cache.starts(), 1);
        assert_eq!(sup.status("cache").await.unwrap(), ServiceStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_dependents_first() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let db = TestService::new("db", &log);
        let api = TestService::new("api", &log);

        sup.register(spec(
            descriptor("db")
                .with_auto_start(true)
                .with_health_check_interval(Duration::from_millis(20)),
            &db,
        ))
        .await
        .unwrap();
        sup.register(spec(
            descriptor("api").with_dependency("db").with_auto_start(true),
            &api,
        ))
        .await
        .unwrap();

        sup.shutdown().await.unwrap();

        assert_eq!(
            log.snapshot(),
            vec!["start:db", "start:api", "stop:api", "stop:db"]
        );
        assert_eq!(sup.list_by_status(ServiceStatus::Stopped).await.len(), 2);
        assert!(!sup.probe_armed("db").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_round_trip_resumes_monitoring() {
        let sup1 = Supervisor::new(SupervisorConfig::default());
        let log1 = Arc::new(CallLog::default());
        let cache1 = TestService::new("cache", &log1);
        let db1 = TestService::new("db", &log1);

        sup1.register(spec(
            descriptor("cache").with_health_check_interval(Duration::from_millis(30)),
            &cache1,
        ))
        .await
        .unwrap();
        sup1.register(spec(descriptor("db"), &db1)).await.unwrap();
        sup1.start("cache").await.unwrap();

        let recorded = eventually(|| {
            let sup1 = Arc::clone(&sup1);
            async move { sup1.health_history("cache").await.len() >= 2 }
        })
        .await;
        assert!(recorded);

        let snap = sup1.export_snapshot().await;
        assert_eq!(snap.services.len(), 2);

        // fresh process: same hooks registered, then state restored
        let sup2 = Supervisor::new(SupervisorConfig::default());
        let log2 = Arc::new(CallLog::default());
        let cache2 = TestService::new("cache", &log2);
        let db2 = TestService::new("db", &log2);
        sup2.register(spec(
            descriptor("cache").with_health_check_interval(Duration::from_millis(30)),
            &cache2,
        ))
        .await
        .unwrap();
        sup2.register(spec(descriptor("db"), &db2)).await.unwrap();

        sup2.import_snapshot(snap.clone()).await.unwrap();

        assert_eq!(sup2.list().await, snap.services);
        assert_eq!(sup2.status("cache").await.unwrap(), ServiceStatus::Running);
        assert_eq!(sup2.status("db").await.unwrap(), ServiceStatus::Stopped);
        let imported: Vec<HealthRecord> = sup2.health_history("cache").await;
        assert_eq!(
            imported,
            snap.health_checks
                .iter()
                .filter(|r| r.service == "cache")
                .cloned()
                .collect::<Vec<_>>()
        );

        // monitoring resumed without the start hook being re-invoked
        assert!(sup2.probe_armed("cache").await);
        assert_eq!(cache2.starts(), 0);
        let baseline = imported.len();
        let resumed = eventually(|| {
            let sup2 = Arc::clone(&sup2);
            async move { sup2.health_history("cache").await.len() > baseline }
        })
        .await;
        assert!(resumed, "imported Running service must keep producing records");
        assert_eq!(cache2.starts(), 0);
    }

    #[tokio::test]
    async fn test_import_unknown_service_fails_cleanly() {
        let sup1 = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);
        sup1.register(spec(descriptor("cache"), &cache)).await.unwrap();
        let snap = sup1.export_snapshot().await;

        let sup2 = Supervisor::new(SupervisorConfig::default());
        let err = sup2.import_snapshot(snap).await.unwrap_err();
        assert_eq!(err.as_label(), "not_found");
        assert!(sup2.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_json_round_trip() {
        let sup = Supervisor::new(SupervisorConfig::default());
        let log = Arc::new(CallLog::default());
        let cache = TestService::new("cache", &log);
        sup.register(spec(descriptor("cache"), &cache)).await.unwrap();
        sup.start("cache").await.unwrap();

        let snap = sup.export_snapshot().await;
        let json = snap.to_json().unwrap();
        assert_eq!(Snapshot::from_json(&json).unwrap(), snap);
    }
}
