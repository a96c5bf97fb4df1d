use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{info, warn};
use vpn_infra::ComputeProvider;

use crate::endpoint::{Endpoint, EndpointStatus};
use crate::identity::new_id;
use crate::provisioner::{Provisioner, ProvisionerConfig};
use crate::registry::EndpointRegistry;
use crate::restore::restore_endpoints;
use crate::tunnel::ConfigGenerator;
use crate::{Error, Result};

/// Create, list, get and destroy VPN endpoints.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct EndpointService {
    registry: EndpointRegistry,
    provider: Arc<dyn ComputeProvider>,
    generator: Arc<dyn ConfigGenerator>,
    provisioner: Provisioner,
    ready: Arc<watch::Sender<bool>>,
    destroying: Arc<Mutex<HashSet<String>>>,
}

/// Marks an endpoint as being destroyed until dropped.
struct DestroyGuard {
    id: String,
    destroying: Arc<Mutex<HashSet<String>>>,
}

impl Drop for DestroyGuard {
    fn drop(&mut self) {
        self.destroying
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

impl EndpointService {
    pub fn new(
        provider: Arc<dyn ComputeProvider>,
        generator: Arc<dyn ConfigGenerator>,
        config: ProvisionerConfig,
    ) -> Self {
        let registry = EndpointRegistry::new();
        let provisioner = Provisioner::new(
            registry.clone(),
            provider.clone(),
            generator.clone(),
            config,
        );
        Self {
            registry,
            provider,
            generator,
            provisioner,
            ready: Arc::new(watch::Sender::new(false)),
            destroying: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Register a new endpoint and start provisioning it in the background.
    ///
    /// Returns the `Starting` snapshot without waiting for provisioning.
    pub async fn create_endpoint(&self, region: &str) -> Result<Endpoint> {
        let endpoint = Endpoint::starting(new_id());
        self.registry.insert(endpoint.clone()).await?;
        info!(endpoint_id = %endpoint.id, region, "endpoint created");

        self.provisioner
            .spawn(endpoint.id.clone(), region.to_string());
        Ok(endpoint)
    }

    pub async fn list_endpoints(&self) -> Vec<Endpoint> {
        self.registry.list().await
    }

    pub async fn get_endpoint(&self, id: &str) -> Result<Endpoint> {
        self.registry
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Delete the endpoint's instance, if any, and mark it `Destroyed`.
    ///
    /// Destroying an already destroyed endpoint returns it unchanged without
    /// touching the provider. Endpoints still provisioning are refused with
    /// `Busy`. If the provider delete fails the status is left as is, so the
    /// call can be retried.
    pub async fn destroy_endpoint(&self, id: &str) -> Result<Endpoint> {
        let _guard = self.begin_destroy(id)?;

        let endpoint = self.get_endpoint(id).await?;
        match endpoint.status {
            EndpointStatus::Destroyed => return Ok(endpoint),
            EndpointStatus::Starting => {
                return Err(Error::Busy {
                    id: id.to_string(),
                    reason: "provisioning in progress",
                });
            }
            EndpointStatus::Running | EndpointStatus::Failed => {}
        }

        if let Some(instance_id) = &endpoint.instance_id {
            if let Err(source) = self.provider.delete_instance(instance_id).await {
                warn!(endpoint_id = %id, instance_id = %instance_id, error = %source, "instance deletion failed");
                return Err(Error::Deletion {
                    id: id.to_string(),
                    instance_id: instance_id.clone(),
                    source,
                });
            }
        }

        let destroyed = self
            .registry
            .update(id, |endpoint| {
                endpoint.mark_destroyed();
                endpoint.clone()
            })
            .await?;
        info!(endpoint_id = %id, "endpoint destroyed");
        Ok(destroyed)
    }

    fn begin_destroy(&self, id: &str) -> Result<DestroyGuard> {
        let mut destroying = self.destroying.lock().unwrap_or_else(|e| e.into_inner());
        if !destroying.insert(id.to_string()) {
            return Err(Error::Busy {
                id: id.to_string(),
                reason: "destroy already in progress",
            });
        }
        Ok(DestroyGuard {
            id: id.to_string(),
            destroying: self.destroying.clone(),
        })
    }

    /// Adopt remote instances unknown to the registry, then signal readiness.
    ///
    /// On failure nothing is adopted and readiness is left untouched.
    pub async fn restore(&self) -> Result<usize> {
        let adopted =
            restore_endpoints(&self.registry, &*self.provider, &*self.generator).await?;
        info!(adopted, provider = self.provider.name(), "endpoint restore complete");
        self.ready.send_replace(true);
        Ok(adopted)
    }

    /// Whether a restore has completed.
    pub fn ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until a restore has completed.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }
}
