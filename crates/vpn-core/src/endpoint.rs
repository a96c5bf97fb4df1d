use serde::{Deserialize, Serialize};
use std::fmt;
use vpn_infra::types::InstanceId;

/// Endpoint lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    Starting,
    Running,
    Failed,
    Destroyed,
}

impl EndpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A VPN endpoint and its (possibly not yet existing) backing instance.
///
/// Only `id`, `config` and `status` are serialized; the address and the
/// provider-side instance id stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub id: String,
    #[serde(skip)]
    pub ip: String,
    pub config: String,
    #[serde(skip)]
    pub instance_id: Option<InstanceId>,
    pub status: EndpointStatus,
}

impl Endpoint {
    /// A freshly created endpoint, waiting for provisioning.
    pub fn starting(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ip: String::new(),
            config: String::new(),
            instance_id: None,
            status: EndpointStatus::Starting,
        }
    }

    pub fn running(
        id: impl Into<String>,
        ip: impl Into<String>,
        config: impl Into<String>,
        instance_id: InstanceId,
    ) -> Self {
        Self {
            id: id.into(),
            ip: ip.into(),
            config: config.into(),
            instance_id: Some(instance_id),
            status: EndpointStatus::Running,
        }
    }

    pub(crate) fn mark_failed(&mut self, instance_id: Option<InstanceId>) {
        self.ip.clear();
        self.config.clear();
        self.instance_id = instance_id;
        self.status = EndpointStatus::Failed;
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.ip.clear();
        self.config.clear();
        self.status = EndpointStatus::Destroyed;
    }
}
