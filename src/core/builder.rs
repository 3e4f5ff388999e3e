//! Builder wiring all supervisor components together.

use std::sync::Arc;

use crate::config::SupervisorConfig;
use crate::events::{Bus, EventRecorder};
use crate::health::{HealthMonitor, RestartPolicyEngine};
use crate::subscribers::{Subscribe, SubscriberSet};

use super::controller::LifecycleController;
use super::registry::Registry;
use super::supervisor::Supervisor;

/// Builder for constructing a [`Supervisor`].
///
/// ## Example
/// ```no_run
/// use servisor::{Supervisor, SupervisorConfig};
///
/// # async fn wire() {
/// let sup = Supervisor::builder(SupervisorConfig::default()).build();
/// # let _ = sup;
/// # }
/// ```
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Replaces the subscriber list.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor and spawns its listener tasks.
    ///
    /// Must be called within a Tokio runtime: the restart policy listener
    /// (and the subscriber fan-out, if any subscribers were added) are
    /// spawned here.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let recorder = Arc::new(EventRecorder::new(self.cfg.health_history_limit));
        let registry = Arc::new(Registry::new());
        let (monitor, reports) =
            HealthMonitor::new(Arc::clone(&recorder), self.cfg.hook_timeout_opt());

        let controller = Arc::new(LifecycleController::new(
            Arc::clone(&registry),
            Arc::clone(&monitor),
            Arc::clone(&recorder),
            bus.clone(),
            self.cfg.hook_timeout_opt(),
        ));

        let policy = RestartPolicyEngine::new(
            Arc::clone(&registry),
            Arc::clone(&controller),
            Arc::clone(&monitor),
        );
        let policy_listener = policy.spawn_listener(reports);

        let subs = Arc::new(SubscriberSet::new(self.subscribers));
        let subscriber_listener = if subs.is_empty() {
            None
        } else {
            Some(Arc::clone(&subs).spawn_listener(bus.subscribe()))
        };

        Arc::new(Supervisor::new_internal(
            self.cfg,
            bus,
            registry,
            recorder,
            monitor,
            controller,
            subs,
            policy_listener,
            subscriber_listener,
        ))
    }
}
