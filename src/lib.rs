//! # servisor
//!
//! **Servisor** is a process-local service lifecycle supervisor for Rust.
//!
//! It registers named services behind a uniform start/stop/health-probe
//! contract, starts them in dependency order, keeps them alive under a
//! bounded restart policy, and records every transition for audit and
//! recovery. The crate is an in-process library: the application's
//! composition root constructs one [`Supervisor`] and wires its own routes
//! and workers around it.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  ServiceSpec │   │  ServiceSpec │   │  ServiceSpec │
//!     │ (descriptor  │   │ (descriptor  │   │ (descriptor  │
//!     │   + hooks)   │   │   + hooks)   │   │   + hooks)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (facade, explicitly constructed, no global state)     │
//! │  - Registry (descriptor storage + validation)                     │
//! │  - resolver (cycle detection, start/shutdown order)               │
//! │  - LifecycleController (per-id serialized start/stop/restart)     │
//! │  - HealthMonitor (one cancellable probe task per Running service) │
//! │  - RestartPolicyEngine (bounded automatic restarts)               │
//! │  - EventRecorder (synchronous audit log) + Bus (subscriber fan-out)│
//! └──────┬──────────────────────┬──────────────────────┬──────────────┘
//!        ▼                      ▼                      ▼
//!   start(id):             probe tick:            export_snapshot():
//!     deps first ──►         check_health() ──►     {services,
//!     start() hook ──►       HealthRecord ──►        healthChecks,
//!     Running, arm probe     Unhealthy → policy      lastUpdate}
//! ```
//!
//! ## Lifecycle
//! ```text
//! Stopped → Starting → Running → Stopping → Stopped
//! Running → Restarting → Starting (retry) | Stopped (cap exceeded)
//! any in-flight state → Failed on hook error
//! ```
//!
//! Unhealthy probes consume restart attempts until `max_restarts` is
//! reached, after which the service is pinned to Stopped until an operator
//! starts it again (which clears the counter).
//!
//! ## Features
//! | Area            | Description                                         | Key types / traits                      |
//! |-----------------|-----------------------------------------------------|-----------------------------------------|
//! | **Services**    | Descriptors, the hook contract, closure services.   | [`ServiceDescriptor`], [`Service`], [`ServiceFn`] |
//! | **Lifecycle**   | Dependency-ordered start, serialized transitions.   | [`Supervisor`], [`resolver`]            |
//! | **Health**      | Periodic probes, bounded automatic restarts.        | [`Health`], [`HealthRecord`]            |
//! | **Events**      | Audit log plus broadcast fan-out to subscribers.    | [`LifecycleEvent`], [`EventRecorder`], [`Subscribe`] |
//! | **Persistence** | Snapshot export/import for process-restart recovery.| [`Snapshot`]                            |
//! | **Errors**      | Typed supervisor and hook errors.                   | [`SupervisorError`], [`HookError`]      |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber forwarding events to
//!   `tracing`.
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use servisor::{
//!     Health, ServiceDescriptor, ServiceFn, ServiceSpec, Supervisor, SupervisorConfig,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::new(SupervisorConfig::default());
//!
//!     // a cache with a periodic health probe
//!     sup.register(ServiceSpec::new(
//!         ServiceDescriptor::new("cache", "Cache Warmer", "cache")
//!             .with_auto_start(true)
//!             .with_max_restarts(2)
//!             .with_health_check_interval(Duration::from_secs(5)),
//!         ServiceFn::new()
//!             .on_start(|| async { Ok(()) })
//!             .on_health(|| async { Ok(Health::healthy()) })
//!             .arc(),
//!     ))
//!     .await?;
//!
//!     // an API synchronizer that requires the cache
//!     sup.register(ServiceSpec::new(
//!         ServiceDescriptor::new("api", "API Sync", "sync")
//!             .with_dependency("cache")
//!             .with_auto_start(true),
//!         ServiceFn::new().on_start(|| async { Ok(()) }).arc(),
//!     ))
//!     .await?;
//!
//!     // ... application runs ...
//!
//!     let snapshot = sup.export_snapshot().await;
//!     println!("{}", snapshot.to_json()?);
//!     sup.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod health;
mod services;
mod snapshot;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{LifecycleController, Supervisor, SupervisorBuilder, resolver};
pub use config::SupervisorConfig;
pub use error::{HookError, SupervisorError};
pub use events::{Bus, EventKind, EventRecorder, LifecycleEvent};
pub use health::{Health, HealthMetrics, HealthMonitor, HealthRecord, HealthState};
pub use services::{
    Service, ServiceDescriptor, ServiceFn, ServiceRef, ServiceRuntime, ServiceSettings,
    ServiceSpec, ServiceStatus,
};
pub use snapshot::Snapshot;
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose the tracing-backed logging subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
