//! Service model: descriptors, the hook contract, and registration bundles.
//!
//! ## Contents
//! - [`ServiceDescriptor`], [`ServiceSettings`], [`ServiceRuntime`],
//!   [`ServiceStatus`] — the registry's data model
//! - [`Service`], [`ServiceRef`] — the three-hook contract implemented by
//!   supervised units
//! - [`ServiceFn`] — closure-backed implementation for tests and glue code
//! - [`ServiceSpec`] — descriptor + hooks bundle handed to registration

mod descriptor;
mod service;
mod service_fn;
mod spec;

pub use descriptor::{ServiceDescriptor, ServiceRuntime, ServiceSettings, ServiceStatus};
pub use service::{Service, ServiceRef};
pub use service_fn::ServiceFn;
pub use spec::ServiceSpec;
