//! Lifecycle events: data model, broadcast bus, and the audit recorder.
//!
//! ## Contents
//! - [`EventKind`], [`LifecycleEvent`] — event classification and metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast` (observability
//!   fan-out, lossy by design)
//! - [`EventRecorder`] — synchronous append-only audit log with queries
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (register/deregister), the lifecycle
//!   controller (every transition).
//! - **Consumers**: the subscriber fan-out listener; tests and operators via
//!   the recorder queries.

mod bus;
mod event;
mod recorder;

pub use bus::Bus;
pub use event::{EventKind, LifecycleEvent};
pub use recorder::EventRecorder;
