//! # Append-only recorder for lifecycle events and health records.
//!
//! The recorder is the supervisor's audit log. Unlike the bus, it is written
//! synchronously at every transition, so its contents are complete and
//! ordered even when bus subscribers lag.
//!
//! ## Rules
//! - Events and health records are never mutated after being appended.
//! - Per-service health history is pruned oldest-first once it exceeds the
//!   configured retention limit (`0` = unbounded). Retention is a memory
//!   bound, not a correctness mechanism.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::health::HealthRecord;

use super::event::LifecycleEvent;

/// In-memory append-only store with query APIs.
pub struct EventRecorder {
    events: RwLock<Vec<LifecycleEvent>>,
    health: RwLock<HashMap<String, Vec<HealthRecord>>>,
    history_limit: usize,
}

impl EventRecorder {
    /// Creates an empty recorder retaining at most `history_limit` health
    /// records per service (`0` = unbounded).
    pub(crate) fn new(history_limit: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            health: RwLock::new(HashMap::new()),
            history_limit,
        }
    }

    /// Appends one lifecycle event.
    pub(crate) async fn record_event(&self, ev: LifecycleEvent) {
        self.events.write().await.push(ev);
    }

    /// Appends one health record, pruning the service's oldest records past
    /// the retention limit.
    pub(crate) async fn record_health(&self, record: HealthRecord) {
        let mut health = self.health.write().await;
        let history = health.entry(record.service.clone()).or_default();
        history.push(record);
        if self.history_limit > 0 && history.len() > self.history_limit {
            let excess = history.len() - self.history_limit;
            history.drain(..excess);
        }
    }

    /// Replaces the whole health history (snapshot import).
    pub(crate) async fn replace_health(&self, records: Vec<HealthRecord>) {
        let mut next: HashMap<String, Vec<HealthRecord>> = HashMap::new();
        for record in records {
            next.entry(record.service.clone()).or_default().push(record);
        }
        for history in next.values_mut() {
            history.sort_by_key(|r| r.at);
        }
        *self.health.write().await = next;
    }

    /// Returns every recorded event in emission order.
    pub async fn events(&self) -> Vec<LifecycleEvent> {
        self.events.read().await.clone()
    }

    /// Returns the events for one service, in emission order.
    pub async fn events_for(&self, service: &str) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|ev| ev.service.as_deref() == Some(service))
            .cloned()
            .collect()
    }

    /// Returns the health history for one service, oldest first.
    pub async fn health_for(&self, service: &str) -> Vec<HealthRecord> {
        self.health
            .read()
            .await
            .get(service)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every health record across all services, ordered by
    /// timestamp (ties keep per-service append order).
    pub async fn all_health(&self) -> Vec<HealthRecord> {
        let health = self.health.read().await;
        let mut all: Vec<HealthRecord> = health.values().flatten().cloned().collect();
        all.sort_by_key(|r| r.at);
        all
    }
}
