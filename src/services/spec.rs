//! # Registration bundle for one service.
//!
//! [`ServiceSpec`] pairs a [`ServiceDescriptor`] with the hook
//! implementation that backs it. The spec is passed to
//! [`Supervisor::register`](crate::Supervisor::register); on success the
//! descriptor is stored with a fresh runtime and — if `auto_start` is set —
//! the service is started immediately.

use super::{ServiceDescriptor, ServiceRef};

/// Descriptor plus hooks, ready for registration.
///
/// ## Example
/// ```
/// use servisor::{ServiceDescriptor, ServiceFn, ServiceSpec};
///
/// let spec = ServiceSpec::new(
///     ServiceDescriptor::new("relay", "Webhook Relay", "relay"),
///     ServiceFn::new().on_start(|| async { Ok(()) }).arc(),
/// );
/// assert_eq!(spec.descriptor().id, "relay");
/// ```
#[derive(Clone)]
pub struct ServiceSpec {
    descriptor: ServiceDescriptor,
    service: ServiceRef,
}

impl ServiceSpec {
    /// Creates a new registration bundle.
    pub fn new(descriptor: ServiceDescriptor, service: ServiceRef) -> Self {
        Self {
            descriptor,
            service,
        }
    }

    /// Returns the descriptor.
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// Returns the hook handle.
    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    /// Splits the bundle into its parts.
    pub(crate) fn into_parts(self) -> (ServiceDescriptor, ServiceRef) {
        (self.descriptor, self.service)
    }
}
