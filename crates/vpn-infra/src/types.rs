use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque provider-side instance identifier (e.g. a DigitalOcean droplet ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Specification for creating a compute instance.
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub name: String,
    pub region: String,
}

/// Instance status and metadata returned from the provider.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub name: String,
    pub state: InstanceState,
    pub ipv4: Option<String>,
}

/// Provider-reported instance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Starting,
    Running,
    Stopped,
    Destroyed,
    Unknown,
}
