//! # Lifecycle events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies every state transition a service can go
//! through; [`LifecycleEvent`] carries the metadata (timestamp, service id,
//! reason, restart counter). Events are immutable once written.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order (the bus makes no cross-subscriber ordering
//! promise; the recorder appends in emission order).
//!
//! ## Example
//! ```
//! use servisor::{EventKind, LifecycleEvent};
//!
//! let ev = LifecycleEvent::new(EventKind::Failed)
//!     .with_service("relay")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::Failed);
//! assert_eq!(ev.service.as_deref(), Some("relay"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A descriptor passed validation and was stored.
    ///
    /// Sets: `service`.
    Registered,

    /// The start hook is about to be invoked.
    ///
    /// Sets: `service`.
    Starting,

    /// The start hook succeeded; the service is Running.
    ///
    /// Sets: `service`.
    Started,

    /// The stop hook is about to be invoked (probe already cancelled).
    ///
    /// Sets: `service`.
    Stopping,

    /// The stop hook finished; the service is Stopped.
    ///
    /// Sets: `service`.
    Stopped,

    /// A restart cycle (stop → charge → start) completed successfully.
    ///
    /// Sets: `service`, `restarts` (counter after the charge).
    Restarted,

    /// A lifecycle hook failed; the service is Failed.
    ///
    /// Sets: `service`, `reason` (hook error message).
    Failed,

    /// A descriptor was removed by explicit deregistration.
    ///
    /// Sets: `service`.
    Deregistered,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::Registered => "registered",
            EventKind::Starting => "starting",
            EventKind::Started => "started",
            EventKind::Stopping => "stopping",
            EventKind::Stopped => "stopped",
            EventKind::Restarted => "restarted",
            EventKind::Failed => "failed",
            EventKind::Deregistered => "deregistered",
        }
    }
}

/// One immutable lifecycle transition.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs and audits)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct LifecycleEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: DateTime<Utc>,
    /// Event classification.
    pub kind: EventKind,
    /// The service the transition belongs to.
    pub service: Option<Arc<str>>,
    /// Human-readable reason (hook error messages, etc.).
    pub reason: Option<Arc<str>>,
    /// Restart counter value, attached to `Restarted` events.
    pub restarts: Option<u32>,
}

impl LifecycleEvent {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Utc::now(),
            kind,
            service: None,
            reason: None,
            restarts: None,
        }
    }

    /// Attaches a service id.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the restart counter.
    #[inline]
    pub fn with_restarts(mut self, restarts: u32) -> Self {
        self.restarts = Some(restarts);
        self
    }
}
