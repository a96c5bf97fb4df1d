pub mod digitalocean;
pub mod mock;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use types::{InstanceId, InstanceInfo, InstanceSpec};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("digitalocean provider error: {0}")]
    DigitalOcean(#[from] do_api::Error),

    #[error("invalid instance id: {0}")]
    InvalidId(String),

    #[error("missing env var: {0}")]
    MissingEnv(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Injected failure from the mock provider.
    #[error("mock provider failure: {0}")]
    Mock(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Backend-agnostic interface for the compute instances backing VPN endpoints.
///
/// Each provider owns its own configuration, loaded from environment
/// variables at construction.
#[async_trait]
pub trait ComputeProvider: Send + Sync + 'static {
    /// List every instance this provider manages for us.
    async fn list_instances(&self) -> Result<Vec<InstanceInfo>>;

    /// Request a new instance. Returns as soon as the provider accepted it;
    /// the instance may still be starting and have no address yet.
    async fn create_instance(&self, spec: &InstanceSpec) -> Result<InstanceInfo>;

    /// Get current instance state and address.
    async fn get_instance(&self, id: &InstanceId) -> Result<InstanceInfo>;

    /// Delete an instance permanently. Deleting a missing instance succeeds.
    async fn delete_instance(&self, id: &InstanceId) -> Result<()>;

    /// Provider identifier.
    fn name(&self) -> &'static str;
}

/// Build the provider selected by `VPN_PROVIDER` (default: `digitalocean`).
pub fn build_provider() -> Result<Arc<dyn ComputeProvider>> {
    dotenvy::dotenv().ok();

    let name = std::env::var("VPN_PROVIDER").unwrap_or_else(|_| "digitalocean".into());
    match name.as_str() {
        "digitalocean" => {
            let provider = digitalocean::DigitalOceanProvider::from_env()?;
            tracing::info!("registered DigitalOcean compute provider");
            Ok(Arc::new(provider))
        }
        other => Err(Error::UnknownProvider(other.to_string())),
    }
}
