use async_trait::async_trait;
use do_api::{CreateDropletRequest, DoClient, Droplet};
use tracing::info;

use crate::types::{InstanceId, InstanceInfo, InstanceSpec, InstanceState};
use crate::{ComputeProvider, Error, Result};

/// DigitalOcean droplet provider.
///
/// Delegates to `do_api::DoClient` for all HTTP calls. Every droplet it
/// creates carries `tag`, and listing is restricted to that tag.
pub struct DigitalOceanProvider {
    client: DoClient,
    image: String,
    size: String,
    tag: String,
    ssh_keys: Vec<String>,
    user_data: Option<String>,
}

impl DigitalOceanProvider {
    /// Create from env vars:
    ///
    /// - `DO_API_TOKEN` (required)
    /// - `DO_IMAGE` (default: `"ubuntu-24-04-x64"`)
    /// - `DO_SIZE` (default: `"s-1vcpu-1gb"`)
    /// - `DO_TAG` (default: `"vpn"`)
    /// - `DO_SSH_KEYS` (comma-separated fingerprints or IDs, optional)
    /// - `DO_USER_DATA_FILE` (path to a cloud-init script, optional)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let token = std::env::var("DO_API_TOKEN")
            .map_err(|_| Error::MissingEnv("DO_API_TOKEN".into()))?;

        let user_data = match std::env::var("DO_USER_DATA_FILE") {
            Ok(path) => Some(std::fs::read_to_string(&path).map_err(|e| {
                Error::MissingEnv(format!("DO_USER_DATA_FILE ({path}): {e}"))
            })?),
            Err(_) => None,
        };

        let ssh_keys = std::env::var("DO_SSH_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            client: DoClient::new(token),
            image: std::env::var("DO_IMAGE").unwrap_or_else(|_| "ubuntu-24-04-x64".into()),
            size: std::env::var("DO_SIZE").unwrap_or_else(|_| "s-1vcpu-1gb".into()),
            tag: std::env::var("DO_TAG").unwrap_or_else(|_| "vpn".into()),
            ssh_keys,
            user_data,
        })
    }

    /// Build directly from a client, with default droplet settings.
    pub fn new(client: DoClient) -> Self {
        Self {
            client,
            image: "ubuntu-24-04-x64".into(),
            size: "s-1vcpu-1gb".into(),
            tag: "vpn".into(),
            ssh_keys: Vec::new(),
            user_data: None,
        }
    }

    fn parse_state(status: &str) -> InstanceState {
        match status {
            "active" => InstanceState::Running,
            "new" => InstanceState::Starting,
            "off" => InstanceState::Stopped,
            "archive" => InstanceState::Destroyed,
            _ => InstanceState::Unknown,
        }
    }

    fn parse_id(raw: &InstanceId) -> Result<u64> {
        raw.0
            .parse::<u64>()
            .map_err(|_| Error::InvalidId(raw.0.clone()))
    }

    fn info(droplet: Droplet) -> InstanceInfo {
        InstanceInfo {
            id: InstanceId(droplet.id.to_string()),
            state: Self::parse_state(&droplet.status),
            ipv4: droplet.first_ipv4().map(str::to_string),
            name: droplet.name,
        }
    }
}

#[async_trait]
impl ComputeProvider for DigitalOceanProvider {
    async fn list_instances(&self) -> Result<Vec<InstanceInfo>> {
        let droplets = self.client.list_droplets(Some(&self.tag)).await?;
        Ok(droplets.into_iter().map(Self::info).collect())
    }

    async fn create_instance(&self, spec: &InstanceSpec) -> Result<InstanceInfo> {
        let droplet = self
            .client
            .create_droplet(&CreateDropletRequest {
                name: spec.name.clone(),
                region: spec.region.clone(),
                size: self.size.clone(),
                image: self.image.clone(),
                ssh_keys: self.ssh_keys.clone(),
                user_data: self.user_data.clone(),
                tags: vec![self.tag.clone()],
            })
            .await?;

        info!(droplet_id = droplet.id, status = %droplet.status, "digitalocean: droplet created");
        Ok(Self::info(droplet))
    }

    async fn get_instance(&self, id: &InstanceId) -> Result<InstanceInfo> {
        let droplet = self.client.get_droplet(Self::parse_id(id)?).await?;
        Ok(Self::info(droplet))
    }

    async fn delete_instance(&self, id: &InstanceId) -> Result<()> {
        self.client.delete_droplet(Self::parse_id(id)?).await?;
        info!(droplet_id = %id, "digitalocean: droplet destroyed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "digitalocean"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn maps_droplet_status() {
        assert_eq!(DigitalOceanProvider::parse_state("active"), InstanceState::Running);
        assert_eq!(DigitalOceanProvider::parse_state("new"), InstanceState::Starting);
        assert_eq!(DigitalOceanProvider::parse_state("off"), InstanceState::Stopped);
        assert_eq!(DigitalOceanProvider::parse_state("archive"), InstanceState::Destroyed);
        assert_eq!(DigitalOceanProvider::parse_state("weird"), InstanceState::Unknown);
    }

    #[tokio::test]
    async fn rejects_non_numeric_ids_without_calling_api() {
        let server = MockServer::start().await;
        let provider = DigitalOceanProvider::new(DoClient::with_base_url("t", server.uri()));

        let err = provider
            .delete_instance(&InstanceId("abc".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidId(ref id) if id == "abc"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_tagged_droplets_as_instances() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/droplets"))
            .and(query_param("tag_name", "vpn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "droplets": [{
                    "id": 1,
                    "name": "vpn-abc",
                    "status": "active",
                    "networks": {"v4": [{"ip_address": "1.2.3.4", "type": "public"}]},
                }],
                "links": {},
            })))
            .mount(&server)
            .await;

        let provider = DigitalOceanProvider::new(DoClient::with_base_url("t", server.uri()));
        let instances = provider.list_instances().await.unwrap();

        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id, InstanceId("1".into()));
        assert_eq!(instances[0].name, "vpn-abc");
        assert_eq!(instances[0].state, InstanceState::Running);
        assert_eq!(instances[0].ipv4.as_deref(), Some("1.2.3.4"));
    }
}
