//! # Closure-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] assembles a [`Service`] implementation from plain async
//! closures, producing a fresh future per invocation. Hooks you don't set
//! fall back to the trait defaults (no-op stop, healthy probe).
//!
//! Useful for tests, demos, and thin glue services that don't warrant a
//! dedicated type.
//!
//! ## Example
//! ```
//! use servisor::{Health, HookError, ServiceFn, ServiceRef};
//!
//! let svc: ServiceRef = ServiceFn::new()
//!     .on_start(|| async { Ok(()) })
//!     .on_health(|| async { Ok(Health::healthy()) })
//!     .arc();
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::HookError;
use crate::health::Health;

use super::ServiceRef;

type LifecycleHook = Box<dyn Fn() -> BoxFuture<'static, Result<(), HookError>> + Send + Sync>;
type HealthHook = Box<dyn Fn() -> BoxFuture<'static, Result<Health, HookError>> + Send + Sync>;

/// Function-backed service implementation.
///
/// Each configured closure *creates* a new future per hook invocation; there
/// is no hidden shared state between invocations. Share state explicitly via
/// an `Arc<...>` captured by the closure.
#[derive(Default)]
pub struct ServiceFn {
    on_start: Option<LifecycleHook>,
    on_stop: Option<LifecycleHook>,
    on_health: Option<HealthHook>,
}

impl ServiceFn {
    /// Creates a service with all hooks defaulted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start hook.
    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_start = Some(Box::new(move || Box::pin(f())));
        self
    }

    /// Sets the stop hook.
    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.on_stop = Some(Box::new(move || Box::pin(f())));
        self
    }

    /// Sets the health probe hook.
    pub fn on_health<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Health, HookError>> + Send + 'static,
    {
        self.on_health = Some(Box::new(move || Box::pin(f())));
        self
    }

    /// Wraps the service into a shared [`ServiceRef`] handle.
    pub fn arc(self) -> ServiceRef {
        Arc::new(self)
    }
}

#[async_trait]
impl super::Service for ServiceFn {
    async fn start(&self) -> Result<(), HookError> {
        match &self.on_start {
            Some(hook) => hook().await,
            None => Ok(()),
        }
    }

    async fn stop(&self) -> Result<(), HookError> {
        match &self.on_stop {
            Some(hook) => hook().await,
            None => Ok(()),
        }
    }

    async fn check_health(&self) -> Result<Health, HookError> {
        match &self.on_health {
            Some(hook) => hook().await,
            None => Ok(Health::healthy()),
        }
    }
}
