//! Adoption of instances left behind by a previous process.

use tracing::{debug, info, warn};
use vpn_infra::ComputeProvider;
use vpn_infra::types::{InstanceId, InstanceState};

use crate::endpoint::{Endpoint, EndpointStatus};
use crate::identity::parse_id;
use crate::registry::EndpointRegistry;
use crate::tunnel::{ConfigGenerator, TunnelParams};
use crate::{Error, Result};

/// Register every remote endpoint instance the registry does not know yet.
///
/// Returns how many endpoints were adopted. A listing failure aborts before
/// anything is registered. Records already present are never overwritten.
pub async fn restore_endpoints(
    registry: &EndpointRegistry,
    provider: &dyn ComputeProvider,
    generator: &dyn ConfigGenerator,
) -> Result<usize> {
    let instances = provider
        .list_instances()
        .await
        .map_err(Error::Reconciliation)?;

    let mut adopted = 0;
    for instance in instances {
        let Some(id) = parse_id(&instance.name) else {
            continue;
        };

        if instance.state == InstanceState::Destroyed {
            debug!(endpoint_id = %id, instance_id = %instance.id, "skipping destroyed instance");
            continue;
        }

        if registry.get(id).await.is_some() {
            debug!(endpoint_id = %id, "endpoint already managed, not restoring");
            continue;
        }

        let ip = instance.ipv4.clone().filter(|ip| !ip.is_empty());
        let endpoint = match ip {
            Some(ip) if instance.state == InstanceState::Running => {
                match generator
                    .generate(&TunnelParams { endpoint_id: id, ip: &ip })
                    .await
                {
                    Ok(config) => Endpoint::running(id, ip, config, instance.id.clone()),
                    Err(e) => {
                        warn!(endpoint_id = %id, error = %e, "config generation failed, restoring endpoint as failed");
                        failed(id, &instance.id)
                    }
                }
            }
            _ => {
                warn!(
                    endpoint_id = %id,
                    instance_id = %instance.id,
                    state = ?instance.state,
                    "instance is not running with an address, restoring endpoint as failed"
                );
                failed(id, &instance.id)
            }
        };

        let status = endpoint.status;
        if registry.insert_if_absent(endpoint).await {
            adopted += 1;
            if status == EndpointStatus::Running {
                info!(endpoint_id = %id, instance_id = %instance.id, "recovered endpoint");
            }
        }
    }

    Ok(adopted)
}

/// A record that keeps the instance id so a later destroy can reclaim it.
fn failed(id: &str, instance_id: &InstanceId) -> Endpoint {
    let mut endpoint = Endpoint::starting(id);
    endpoint.mark_failed(Some(instance_id.clone()));
    endpoint
}
