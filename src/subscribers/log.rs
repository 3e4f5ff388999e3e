//! # Logging subscriber for debugging and demos.
//!
//! [`LogWriter`] forwards every lifecycle event to `tracing`. Enabled via
//! the `logging` feature.
//!
//! ## Output
//! ```text
//! INFO servisor::subscribers::log: started service=cache
//! WARN servisor::subscribers::log: failed service=api reason="connection refused"
//! ```

use async_trait::async_trait;

use crate::events::{EventKind, LifecycleEvent};

use super::Subscribe;

/// Forwards lifecycle events to `tracing`.
///
/// Failures log at WARN, everything else at INFO. For metrics or custom
/// routing, implement [`Subscribe`] directly.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates the subscriber.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, ev: &LifecycleEvent) {
        let service = ev.service.as_deref().unwrap_or("-");
        match ev.kind {
            EventKind::Failed => {
                tracing::warn!(
                    service,
                    reason = ev.reason.as_deref().unwrap_or("unknown"),
                    "failed"
                );
            }
            EventKind::Restarted => {
                tracing::info!(service, restarts = ev.restarts.unwrap_or(0), "restarted");
            }
            kind => {
                tracing::info!(service, "{}", kind.as_label());
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
