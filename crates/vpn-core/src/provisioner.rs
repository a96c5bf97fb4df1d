//! Background provisioning of newly created endpoints.
//!
//! One task per endpoint: create the instance, poll until it runs with an
//! address, generate the tunnel config, then publish everything in a single
//! registry write. Any failure marks the endpoint `Failed`; nothing retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};
use vpn_infra::ComputeProvider;
use vpn_infra::types::{InstanceId, InstanceInfo, InstanceSpec, InstanceState};

use crate::endpoint::EndpointStatus;
use crate::identity::remote_name;
use crate::registry::EndpointRegistry;
use crate::tunnel::{ConfigGenerator, TunnelParams};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Delay between instance state polls.
    pub poll_interval: Duration,
    /// Give up on an instance that is not running with an address by then.
    pub timeout: Duration,
    /// Delete the instance of an endpoint whose provisioning failed.
    pub cleanup_failed_instances: bool,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(300),
            cleanup_failed_instances: false,
        }
    }
}

#[derive(Clone)]
pub(crate) struct Provisioner {
    registry: EndpointRegistry,
    provider: Arc<dyn ComputeProvider>,
    generator: Arc<dyn ConfigGenerator>,
    config: ProvisionerConfig,
}

impl Provisioner {
    pub(crate) fn new(
        registry: EndpointRegistry,
        provider: Arc<dyn ComputeProvider>,
        generator: Arc<dyn ConfigGenerator>,
        config: ProvisionerConfig,
    ) -> Self {
        Self {
            registry,
            provider,
            generator,
            config,
        }
    }

    /// Provision endpoint `id` in `region` on a background task.
    pub(crate) fn spawn(&self, id: String, region: String) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run(&id, &region).await })
    }

    pub(crate) async fn run(&self, id: &str, region: &str) {
        let mut created = None;
        match self.provision(id, region, &mut created).await {
            Ok(()) => info!(endpoint_id = %id, "endpoint running"),
            Err(e) => {
                error!(endpoint_id = %id, error = %e, "endpoint provisioning failed");
                self.fail(id, created).await;
            }
        }
    }

    async fn provision(
        &self,
        id: &str,
        region: &str,
        created: &mut Option<InstanceId>,
    ) -> Result<()> {
        let spec = InstanceSpec {
            name: remote_name(id),
            region: region.to_string(),
        };
        let instance = self.provider.create_instance(&spec).await?;
        info!(endpoint_id = %id, instance_id = %instance.id, region, "instance requested");
        *created = Some(instance.id.clone());

        let ip = self.wait_for_address(instance).await?;
        let config = self
            .generator
            .generate(&TunnelParams { endpoint_id: id, ip: &ip })
            .await?;

        let instance_id = created.clone();
        let published = self
            .registry
            .update(id, move |endpoint| {
                if endpoint.status != EndpointStatus::Starting {
                    return false;
                }
                endpoint.ip = ip;
                endpoint.config = config;
                endpoint.instance_id = instance_id;
                endpoint.status = EndpointStatus::Running;
                true
            })
            .await?;

        if !published {
            return Err(Error::Provisioning(
                "endpoint left the starting state during provisioning".into(),
            ));
        }
        Ok(())
    }

    async fn wait_for_address(&self, mut instance: InstanceInfo) -> Result<String> {
        let deadline = Instant::now() + self.config.timeout;
        loop {
            match (instance.state, instance.ipv4.take()) {
                (InstanceState::Running, Some(ip)) if !ip.is_empty() => return Ok(ip),
                (InstanceState::Destroyed, _) => {
                    return Err(Error::Provisioning(format!(
                        "instance {} was destroyed while starting",
                        instance.id
                    )));
                }
                _ => {}
            }

            if Instant::now() >= deadline {
                return Err(Error::Provisioning(format!(
                    "instance {} not running after {:?}",
                    instance.id, self.config.timeout
                )));
            }

            tokio::time::sleep(self.config.poll_interval).await;
            instance = self.provider.get_instance(&instance.id).await?;
        }
    }

    async fn fail(&self, id: &str, created: Option<InstanceId>) {
        let mut instance_id = created;

        if self.config.cleanup_failed_instances
            && let Some(instance) = instance_id.clone()
        {
            match self.provider.delete_instance(&instance).await {
                Ok(()) => {
                    info!(endpoint_id = %id, instance_id = %instance, "removed instance of failed endpoint");
                    instance_id = None;
                }
                Err(e) => {
                    warn!(endpoint_id = %id, instance_id = %instance, error = %e, "failed to remove instance of failed endpoint");
                }
            }
        }

        let res = self
            .registry
            .update(id, |endpoint| {
                if endpoint.status == EndpointStatus::Starting {
                    endpoint.mark_failed(instance_id);
                }
            })
            .await;
        if let Err(e) = res {
            error!(endpoint_id = %id, error = %e, "failed to record provisioning failure");
        }
    }
}
