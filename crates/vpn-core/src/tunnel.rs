use async_trait::async_trait;

use crate::{Error, Result};

/// Built-in client profile used when no template is configured.
pub const DEFAULT_TEMPLATE: &str = "\
# endpoint {{endpoint_id}}
client
dev tun
proto udp
remote {{ip}} 1194
resolv-retry infinite
nobind
persist-key
persist-tun
remote-cert-tls server
verb 3
";

/// Inputs for generating a tunnel configuration.
#[derive(Debug, Clone, Copy)]
pub struct TunnelParams<'a> {
    pub endpoint_id: &'a str,
    pub ip: &'a str,
}

/// Produces the opaque configuration blob handed to VPN clients.
#[async_trait]
pub trait ConfigGenerator: Send + Sync + 'static {
    async fn generate(&self, params: &TunnelParams<'_>) -> Result<String>;
}

/// Renders a text template, substituting `{{endpoint_id}}` and `{{ip}}`.
#[derive(Debug, Clone)]
pub struct TemplateConfigGenerator {
    template: String,
}

impl Default for TemplateConfigGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl TemplateConfigGenerator {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let template = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read template {path}: {e}")))?;
        Ok(Self::new(template))
    }

    pub fn render(&self, params: &TunnelParams<'_>) -> Result<String> {
        if params.ip.is_empty() {
            return Err(Error::Config(format!(
                "endpoint {} has no address",
                params.endpoint_id
            )));
        }
        Ok(self
            .template
            .replace("{{endpoint_id}}", params.endpoint_id)
            .replace("{{ip}}", params.ip))
    }
}

#[async_trait]
impl ConfigGenerator for TemplateConfigGenerator {
    async fn generate(&self, params: &TunnelParams<'_>) -> Result<String> {
        self.render(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_placeholders() {
        let generator = TemplateConfigGenerator::new("remote {{ip}} # {{endpoint_id}} {{ip}}");
        let config = generator
            .render(&TunnelParams {
                endpoint_id: "abc",
                ip: "1.2.3.4",
            })
            .unwrap();
        assert_eq!(config, "remote 1.2.3.4 # abc 1.2.3.4");
    }

    #[test]
    fn default_template_points_at_endpoint() {
        let config = TemplateConfigGenerator::default()
            .render(&TunnelParams {
                endpoint_id: "abc",
                ip: "1.2.3.4",
            })
            .unwrap();
        assert!(config.contains("remote 1.2.3.4 1194"));
        assert!(config.contains("# endpoint abc"));
    }

    #[test]
    fn refuses_empty_address() {
        let err = TemplateConfigGenerator::default()
            .render(&TunnelParams {
                endpoint_id: "abc",
                ip: "",
            })
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
