//! # SubscriberSet: fan-out of bus events to subscribers.
//!
//! One listener task drains the bus and hands each event to every
//! subscriber in turn. Panics inside a subscriber are caught and logged so
//! one bad handler cannot take down the listener or its peers.
//!
//! ```text
//! Bus ──► listener ──► sub1.on_event() ──► sub2.on_event() ──► ...
//!                       └─ panic caught, logged, next subscriber
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::events::LifecycleEvent;

use super::Subscribe;

/// Fan-out over a fixed set of subscribers.
pub struct SubscriberSet {
    subs: Vec<Arc<dyn Subscribe>>,
}

impl SubscriberSet {
    /// Creates a set over the given subscribers.
    pub(crate) fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs }
    }

    /// Returns true if there is nothing to fan out to.
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Spawns the listener draining `rx` until the bus closes.
    pub(crate) fn spawn_listener(
        self: Arc<Self>,
        mut rx: broadcast::Receiver<LifecycleEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => self.emit(&ev).await,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged, events skipped");
                        continue;
                    }
                }
            }
        })
    }

    /// Delivers one event to every subscriber, isolating panics.
    pub(crate) async fn emit(&self, ev: &LifecycleEvent) {
        for sub in &self.subs {
            let delivery = std::panic::AssertUnwindSafe(sub.on_event(ev)).catch_unwind();
            if delivery.await.is_err() {
                tracing::error!(
                    subscriber = sub.name(),
                    event = ev.kind.as_label(),
                    "subscriber panicked while handling event"
                );
            }
        }
    }
}
