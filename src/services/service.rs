//! # Service hook contract.
//!
//! This module defines the [`Service`] trait — the uniform three-hook
//! contract every supervised unit implements. The common handle type is
//! [`ServiceRef`], an `Arc<dyn Service>` suitable for sharing across the
//! runtime.
//!
//! The supervisor never inspects what a unit does: an AI-completion worker,
//! a webhook relay, and a cache warmer all look the same through these
//! hooks.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HookError;
use crate::health::Health;

/// Shared handle to a service implementation.
pub type ServiceRef = Arc<dyn Service>;

/// # Uniform lifecycle contract for one supervised unit.
///
/// Each hook runs under the configured invocation timeout; exceeding it
/// counts as hook failure. Hooks are never invoked concurrently for one
/// service: the controller serializes start/stop/restart per id, and the
/// probe task is cancelled before the stop hook runs.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use servisor::{Health, HookError, Service};
///
/// struct CacheWarmer;
///
/// #[async_trait]
/// impl Service for CacheWarmer {
///     async fn start(&self) -> Result<(), HookError> {
///         // open connections, spawn workers...
///         Ok(())
///     }
///
///     async fn check_health(&self) -> Result<Health, HookError> {
///         Ok(Health::healthy())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Brings the service up. Called only after every dependency is Running.
    async fn start(&self) -> Result<(), HookError>;

    /// Tears the service down. Default: nothing to do.
    async fn stop(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Reports the service's current health. Called periodically while
    /// Running when a probe interval is configured. Default: healthy with
    /// zero gauges.
    async fn check_health(&self) -> Result<Health, HookError> {
        Ok(Health::healthy())
    }
}
