use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use vpn_core::ProvisionerConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub api_key: String,
    pub provision_poll_interval_secs: u64,
    pub provision_timeout_secs: u64,
    pub cleanup_failed_instances: bool,
    pub config_template: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".into())
                .parse()
                .expect("LISTEN_ADDR must be a valid socket address"),
            api_key: env::var("API_KEY").expect("API_KEY must be set"),
            provision_poll_interval_secs: env::var("PROVISION_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .expect("PROVISION_POLL_INTERVAL_SECS must be a valid u64"),
            provision_timeout_secs: env::var("PROVISION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .expect("PROVISION_TIMEOUT_SECS must be a valid u64"),
            cleanup_failed_instances: env::var("CLEANUP_FAILED_INSTANCES")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .expect("CLEANUP_FAILED_INSTANCES must be true or false"),
            config_template: env::var("VPN_CONFIG_TEMPLATE").ok(),
        }
    }

    /// A zero poll interval is raised to one second.
    pub fn provisioner(&self) -> ProvisionerConfig {
        ProvisionerConfig {
            poll_interval: Duration::from_secs(self.provision_poll_interval_secs.max(1)),
            timeout: Duration::from_secs(self.provision_timeout_secs),
            cleanup_failed_instances: self.cleanup_failed_instances,
        }
    }
}
