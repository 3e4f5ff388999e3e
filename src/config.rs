//! # Global supervisor configuration.
//!
//! Provides [`SupervisorConfig`] — centralized settings for the supervisor
//! runtime, consumed once by [`SupervisorBuilder`](crate::SupervisorBuilder).
//!
//! ## Sentinel values
//! - `hook_timeout = 0s` → hooks run without a timeout
//! - `health_history_limit = 0` → unbounded health history
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

use std::time::Duration;

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `hook_timeout`: upper bound for one `start`/`stop`/`check_health` hook
///   invocation (`0s` = no timeout); exceeding it counts as hook failure
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `health_history_limit`: health records retained per service, oldest
///   pruned first (`0` = unbounded)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time one hook invocation may take before it counts as failed.
    ///
    /// Applied independently to `start`, `stop`, and `check_health`.
    /// `Duration::ZERO` disables the timeout.
    pub hook_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events will
    /// skip older items. The recorder is written synchronously and is not
    /// affected by bus capacity.
    pub bus_capacity: usize,

    /// Maximum health records kept per service before old ones are pruned.
    ///
    /// `0` keeps everything.
    pub health_history_limit: usize,
}

impl SupervisorConfig {
    /// Returns the hook timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per hook invocation
    #[inline]
    pub fn hook_timeout_opt(&self) -> Option<Duration> {
        if self.hook_timeout == Duration::ZERO {
            None
        } else {
            Some(self.hook_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `hook_timeout = 30s`
    /// - `bus_capacity = 1024`
    /// - `health_history_limit = 256`
    fn default() -> Self {
        Self {
            hook_timeout: Duration::from_secs(30),
            bus_capacity: 1024,
            health_history_limit: 256,
        }
    }
}
