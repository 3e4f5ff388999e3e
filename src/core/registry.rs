//! # Service registry: storage and validation.
//!
//! One entry per service id: the descriptor plus the hook handle. The
//! registry validates and stores; it never invokes hooks and never decides
//! transitions — the controller and the policy engine mutate runtime state
//! exclusively through the methods here.
//!
//! ## Rules
//! - Registration is atomic: a rejected descriptor (validation or cycle)
//!   leaves the map byte-for-byte unchanged.
//! - Dependencies may reference ids that are not registered yet (partial
//!   graphs); the gap surfaces as `NotFound` when a start walks the graph.
//! - Removal requires Stopped or Failed, forcing an explicit stop first.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::SupervisorError;
use crate::services::{
    ServiceDescriptor, ServiceRef, ServiceRuntime, ServiceSpec, ServiceStatus,
};

use super::resolver::{self, Graph};

/// Stored pairing of descriptor and hooks.
struct ServiceEntry {
    descriptor: ServiceDescriptor,
    service: ServiceRef,
}

/// Validated storage of service descriptors and hook handles.
pub struct Registry {
    entries: RwLock<HashMap<String, ServiceEntry>>,
}

impl Registry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Validates and stores a new descriptor with a fresh runtime
    /// (`Stopped`, zero restarts). Returns the stored descriptor.
    pub(crate) async fn insert(
        &self,
        spec: ServiceSpec,
    ) -> Result<ServiceDescriptor, SupervisorError> {
        let (mut descriptor, service) = spec.into_parts();
        validate(&descriptor)?;

        let mut entries = self.entries.write().await;
        if entries.contains_key(&descriptor.id) {
            return Err(SupervisorError::InvalidState {
                service: descriptor.id,
                reason: "already registered".into(),
            });
        }

        let mut graph: Graph = entries
            .values()
            .map(|e| (e.descriptor.id.clone(), e.descriptor.dependencies.clone()))
            .collect();
        graph.insert(descriptor.id.clone(), descriptor.dependencies.clone());
        resolver::check_acyclic(&graph)?;

        descriptor.runtime = ServiceRuntime::default();
        entries.insert(
            descriptor.id.clone(),
            ServiceEntry {
                descriptor: descriptor.clone(),
                service,
            },
        );
        Ok(descriptor)
    }

    /// Removes a descriptor. Requires Stopped or Failed.
    pub(crate) async fn remove(&self, id: &str) -> Result<ServiceDescriptor, SupervisorError> {
        let mut entries = self.entries.write().await;
        let status = entries
            .get(id)
            .map(|e| e.descriptor.runtime.status)
            .ok_or_else(|| SupervisorError::NotFound {
                service: id.to_string(),
            })?;
        if !matches!(status, ServiceStatus::Stopped | ServiceStatus::Failed) {
            return Err(SupervisorError::InvalidState {
                service: id.to_string(),
                reason: format!("cannot deregister while {status}"),
            });
        }
        entries
            .remove(id)
            .map(|e| e.descriptor)
            .ok_or_else(|| SupervisorError::NotFound {
                service: id.to_string(),
            })
    }

    /// Returns a copy of the descriptor.
    pub(crate) async fn descriptor(
        &self,
        id: &str,
    ) -> Result<ServiceDescriptor, SupervisorError> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|e| e.descriptor.clone())
            .ok_or_else(|| SupervisorError::NotFound {
                service: id.to_string(),
            })
    }

    /// Returns the hook handle.
    pub(crate) async fn service(&self, id: &str) -> Result<ServiceRef, SupervisorError> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|e| ServiceRef::clone(&e.service))
            .ok_or_else(|| SupervisorError::NotFound {
                service: id.to_string(),
            })
    }

    /// Returns the current status.
    pub(crate) async fn status(&self, id: &str) -> Result<ServiceStatus, SupervisorError> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|e| e.descriptor.runtime.status)
            .ok_or_else(|| SupervisorError::NotFound {
                service: id.to_string(),
            })
    }

    /// Returns every descriptor, sorted by id.
    pub(crate) async fn list(&self) -> Vec<ServiceDescriptor> {
        let entries = self.entries.read().await;
        let mut all: Vec<ServiceDescriptor> =
            entries.values().map(|e| e.descriptor.clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Returns the descriptors currently in `status`, sorted by id.
    pub(crate) async fn list_by_status(&self, status: ServiceStatus) -> Vec<ServiceDescriptor> {
        let mut matching: Vec<ServiceDescriptor> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.descriptor.runtime.status == status)
            .map(|e| e.descriptor.clone())
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        matching
    }

    /// Returns the declared dependency graph (id → dependency ids).
    pub(crate) async fn graph(&self) -> Graph {
        self.entries
            .read()
            .await
            .values()
            .map(|e| (e.descriptor.id.clone(), e.descriptor.dependencies.clone()))
            .collect()
    }

    /// Sets the status.
    pub(crate) async fn set_status(
        &self,
        id: &str,
        status: ServiceStatus,
    ) -> Result<(), SupervisorError> {
        self.update(id, |rt| rt.status = status).await
    }

    /// Marks the service Running and stamps `last_start`.
    pub(crate) async fn mark_started(&self, id: &str) -> Result<(), SupervisorError> {
        self.update(id, |rt| {
            rt.status = ServiceStatus::Running;
            rt.last_start = Some(chrono::Utc::now());
        })
        .await
    }

    /// Marks the service Stopped and stamps `last_stop`.
    pub(crate) async fn mark_stopped(&self, id: &str) -> Result<(), SupervisorError> {
        self.update(id, |rt| {
            rt.status = ServiceStatus::Stopped;
            rt.last_stop = Some(chrono::Utc::now());
        })
        .await
    }

    /// Marks the service Failed. For a failed stop hook, `last_stop` is
    /// stamped anyway: the stop attempt is part of the bookkeeping.
    pub(crate) async fn mark_failed(
        &self,
        id: &str,
        stop_attempted: bool,
    ) -> Result<(), SupervisorError> {
        self.update(id, |rt| {
            rt.status = ServiceStatus::Failed;
            if stop_attempted {
                rt.last_stop = Some(chrono::Utc::now());
            }
        })
        .await
    }

    /// Advances the restart counter; returns the new value.
    pub(crate) async fn bump_restarts(&self, id: &str) -> Result<u32, SupervisorError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| SupervisorError::NotFound {
                service: id.to_string(),
            })?;
        let rt = &mut entry.descriptor.runtime;
        rt.restart_count = rt.restart_count.saturating_add(1);
        Ok(rt.restart_count)
    }

    /// Clears the restart counter (operator intervention).
    pub(crate) async fn reset_restarts(&self, id: &str) -> Result<(), SupervisorError> {
        self.update(id, |rt| rt.restart_count = 0).await
    }

    /// Replaces every descriptor from a snapshot, reusing the hooks already
    /// registered under the same ids. Fails `NotFound` — without mutating
    /// anything — if any snapshot id has no hooks here.
    pub(crate) async fn replace_all(
        &self,
        descriptors: Vec<ServiceDescriptor>,
    ) -> Result<(), SupervisorError> {
        let mut entries = self.entries.write().await;
        for descriptor in &descriptors {
            if !entries.contains_key(&descriptor.id) {
                return Err(SupervisorError::NotFound {
                    service: descriptor.id.clone(),
                });
            }
        }

        let mut next: HashMap<String, ServiceEntry> = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if let Some(existing) = entries.get(&descriptor.id) {
                next.insert(
                    descriptor.id.clone(),
                    ServiceEntry {
                        service: ServiceRef::clone(&existing.service),
                        descriptor,
                    },
                );
            }
        }
        *entries = next;
        Ok(())
    }

    async fn update<F>(&self, id: &str, f: F) -> Result<(), SupervisorError>
    where
        F: FnOnce(&mut ServiceRuntime),
    {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| SupervisorError::NotFound {
                service: id.to_string(),
            })?;
        f(&mut entry.descriptor.runtime);
        Ok(())
    }
}

fn validate(descriptor: &ServiceDescriptor) -> Result<(), SupervisorError> {
    for (field, value) in [
        ("id", &descriptor.id),
        ("name", &descriptor.name),
        ("type", &descriptor.kind),
    ] {
        if value.trim().is_empty() {
            return Err(SupervisorError::Validation {
                reason: format!("descriptor field `{field}` must not be empty"),
            });
        }
    }
    Ok(())
}
