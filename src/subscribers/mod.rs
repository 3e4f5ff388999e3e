//! Observability fan-out: the [`Subscribe`] trait, the [`SubscriberSet`]
//! listener, and the optional [`LogWriter`].
//!
//! Subscribers ride the bus and are lossy by design; the
//! [`EventRecorder`](crate::EventRecorder) is the authoritative log.

mod set;
mod subscriber;

pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
