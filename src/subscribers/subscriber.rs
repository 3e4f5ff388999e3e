//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] — an extension point for plugging custom event
//! handlers (metrics, alerting, audit shipping) into the supervisor.
//!
//! Subscribers observe the bus through the fan-out listener; they are
//! observability-only and cannot influence lifecycle decisions. The
//! recorder, not the subscriber path, is the authoritative audit log.

use async_trait::async_trait;

use crate::events::LifecycleEvent;

/// Lifecycle event observer.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; panics are caught and logged, and the
///   offending event is skipped for this subscriber only.
///
/// ## Example
/// ```
/// use async_trait::async_trait;
/// use servisor::{EventKind, LifecycleEvent, Subscribe};
///
/// struct FailureCounter;
///
/// #[async_trait]
/// impl Subscribe for FailureCounter {
///     async fn on_event(&self, ev: &LifecycleEvent) {
///         if matches!(ev.kind, EventKind::Failed) {
///             // export a metric, page someone, ...
///         }
///     }
///
///     fn name(&self) -> &'static str { "failure-counter" }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event. Events arrive in bus order.
    async fn on_event(&self, event: &LifecycleEvent);

    /// Returns the subscriber name used in logs.
    ///
    /// Prefer short, descriptive names. The default uses
    /// `type_name::<Self>()`, which can be verbose — override it when
    /// possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
