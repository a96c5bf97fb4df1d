//! VPN endpoint lifecycle: registry, provisioning, restore and the service
//! that ties them together.

pub mod endpoint;
pub mod identity;
pub mod provisioner;
pub mod registry;
pub mod restore;
pub mod service;
pub mod tunnel;

pub use endpoint::{Endpoint, EndpointStatus};
pub use provisioner::ProvisionerConfig;
pub use registry::EndpointRegistry;
pub use service::EndpointService;
pub use tunnel::{ConfigGenerator, TemplateConfigGenerator, TunnelParams};

use vpn_infra::types::InstanceId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("endpoint not found: {0}")]
    NotFound(String),

    #[error("endpoint already registered: {0}")]
    DuplicateId(String),

    #[error("endpoint {id} is busy: {reason}")]
    Busy { id: String, reason: &'static str },

    #[error("failed to delete instance {instance_id} of endpoint {id}: {source}")]
    Deletion {
        id: String,
        instance_id: InstanceId,
        #[source]
        source: vpn_infra::Error,
    },

    #[error("failed to restore endpoints: {0}")]
    Reconciliation(#[source] vpn_infra::Error),

    #[error("provisioning failed: {0}")]
    Provisioning(String),

    #[error("tunnel config error: {0}")]
    Config(String),

    #[error("infra error: {0}")]
    Infra(#[from] vpn_infra::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
