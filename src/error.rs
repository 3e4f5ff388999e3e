//! Error types used by the supervisor and by service hooks.
//!
//! This module defines two main error enums:
//!
//! - [`SupervisorError`] — errors raised by the lifecycle orchestration itself
//!   (registration, graph validation, start/stop/restart, snapshots).
//! - [`HookError`] — errors raised by an individual service hook
//!   (`start` / `stop` / `check_health`).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics. A [`HookError`] returned by a health probe is never
//! surfaced to callers: the monitor downgrades it into an `Unhealthy`
//! health record (see `health::monitor`).

use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the supervisor runtime.
///
/// Registration errors (`Validation`, `CyclicDependency`, `InvalidState`) are
/// synchronous and side-effect-free: a rejected descriptor leaves the registry
/// unchanged. Lifecycle errors (`StartFailure`, `StopFailure`) are returned to
/// the direct caller after state and events have been recorded; they never
/// crash the supervisor or other services.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// A descriptor failed validation (missing id/name/type, etc.).
    #[error("invalid descriptor: {reason}")]
    Validation {
        /// What was wrong with the descriptor.
        reason: String,
    },

    /// Registering the descriptor would create a dependency cycle.
    #[error("cyclic dependency involving [{}]", .cycle.join(", "))]
    CyclicDependency {
        /// Ids participating in the cycle, sorted.
        cycle: Vec<String>,
    },

    /// The referenced service id is not registered.
    #[error("service `{service}` is not registered")]
    NotFound {
        /// The unknown service id.
        service: String,
    },

    /// A start was attempted behind a dependency that is not Running.
    #[error("dependency `{dependency}` of `{service}` is not running")]
    DependencyFailed {
        /// The service whose start was refused.
        service: String,
        /// The offending dependency id.
        dependency: String,
    },

    /// The operation is not valid in the service's current state.
    #[error("invalid state for `{service}`: {reason}")]
    InvalidState {
        /// The service the operation targeted.
        service: String,
        /// Why the operation was refused.
        reason: String,
    },

    /// The service's start hook failed or timed out.
    #[error("start hook for `{service}` failed: {reason}")]
    StartFailure {
        /// The service whose hook failed.
        service: String,
        /// The underlying hook error message.
        reason: String,
    },

    /// The service's stop hook failed or timed out.
    #[error("stop hook for `{service}` failed: {reason}")]
    StopFailure {
        /// The service whose hook failed.
        service: String,
        /// The underlying hook error message.
        reason: String,
    },

    /// A snapshot could not be serialized or deserialized.
    #[error("snapshot error: {reason}")]
    Snapshot {
        /// The underlying serialization error message.
        reason: String,
    },
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::SupervisorError;
    ///
    /// let err = SupervisorError::NotFound { service: "cache".into() };
    /// assert_eq!(err.as_label(), "not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::Validation { .. } => "validation",
            SupervisorError::CyclicDependency { .. } => "cyclic_dependency",
            SupervisorError::NotFound { .. } => "not_found",
            SupervisorError::DependencyFailed { .. } => "dependency_failed",
            SupervisorError::InvalidState { .. } => "invalid_state",
            SupervisorError::StartFailure { .. } => "start_failure",
            SupervisorError::StopFailure { .. } => "stop_failure",
            SupervisorError::Snapshot { .. } => "snapshot",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced by service hooks.
///
/// A hook either fails with a message or exceeds the configured invocation
/// timeout. The controller wraps hook errors into
/// [`SupervisorError::StartFailure`] / [`SupervisorError::StopFailure`];
/// the health monitor downgrades probe-side hook errors into `Unhealthy`
/// records instead of propagating them.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HookError {
    /// The hook reported a failure.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The hook did not complete within the configured timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },
}

impl HookError {
    /// Creates a failure from any displayable error.
    ///
    /// # Example
    /// ```
    /// use servisor::HookError;
    ///
    /// let err = HookError::fail("connection refused");
    /// assert_eq!(err.to_string(), "connection refused");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        HookError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Fail { .. } => "hook_failed",
            HookError::Timeout { .. } => "hook_timeout",
        }
    }

    /// Indicates whether this error came from the invocation timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HookError::Timeout { .. })
    }
}
