//! In-memory provider for tests.
//!
//! Records every call, lets tests inject failures per operation, and can hold
//! `create_instance` calls open so a caller stays mid-provisioning.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::types::{InstanceId, InstanceInfo, InstanceSpec, InstanceState};
use crate::{ComputeProvider, Error, Result};

/// Provider operations, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Create,
    Get,
    Delete,
}

/// A recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create { name: String, region: String },
    Get(InstanceId),
    Delete(InstanceId),
}

#[derive(Default)]
struct MockState {
    instances: Vec<InstanceInfo>,
    next_id: u64,
    calls: Vec<Call>,
    failing: HashSet<Op>,
}

pub struct MockProvider {
    state: Mutex<MockState>,
    hold_creates: watch::Sender<bool>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 1000,
                ..MockState::default()
            }),
            hold_creates: watch::Sender::new(false),
        }
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a running instance, as if created by an earlier process.
    pub fn with_instance(&self, id: &str, name: &str, ipv4: Option<&str>) -> InstanceId {
        self.with_instance_state(id, name, ipv4, InstanceState::Running)
    }

    pub fn with_instance_state(
        &self,
        id: &str,
        name: &str,
        ipv4: Option<&str>,
        state: InstanceState,
    ) -> InstanceId {
        let id = InstanceId(id.to_string());
        self.lock().instances.push(InstanceInfo {
            id: id.clone(),
            name: name.to_string(),
            state,
            ipv4: ipv4.map(str::to_string),
        });
        id
    }

    /// Make every subsequent call of `op` fail.
    pub fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    /// Undo `fail`.
    pub fn recover(&self, op: Op) {
        self.lock().failing.remove(&op);
    }

    /// Block `create_instance` until `release_creates` is called.
    pub fn hold_creates(&self) {
        self.hold_creates.send_replace(true);
    }

    pub fn release_creates(&self) {
        self.hold_creates.send_replace(false);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn deletes(&self) -> Vec<InstanceId> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Delete(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn instances(&self) -> Vec<InstanceInfo> {
        self.lock().instances.clone()
    }

    fn record(&self, call: Call, op: Op) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(&op) {
            return Err(Error::Mock(format!("{op:?} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl ComputeProvider for MockProvider {
    async fn list_instances(&self) -> Result<Vec<InstanceInfo>> {
        self.record(Call::List, Op::List)?;
        Ok(self.instances())
    }

    async fn create_instance(&self, spec: &InstanceSpec) -> Result<InstanceInfo> {
        self.record(
            Call::Create {
                name: spec.name.clone(),
                region: spec.region.clone(),
            },
            Op::Create,
        )?;

        let mut held = self.hold_creates.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        let mut state = self.lock();
        state.next_id += 1;
        let info = InstanceInfo {
            id: InstanceId(state.next_id.to_string()),
            name: spec.name.clone(),
            state: InstanceState::Starting,
            ipv4: None,
        };
        state.instances.push(info.clone());
        Ok(info)
    }

    /// Instances boot on their first poll: they report `Running` with an
    /// address derived from the instance number.
    async fn get_instance(&self, id: &InstanceId) -> Result<InstanceInfo> {
        self.record(Call::Get(id.clone()), Op::Get)?;

        let mut state = self.lock();
        let instance = state
            .instances
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| Error::Mock(format!("instance {id} not found")))?;

        if instance.state == InstanceState::Starting {
            let n: u64 = id.0.parse().unwrap_or(0);
            instance.state = InstanceState::Running;
            instance.ipv4 = Some(format!("203.0.113.{}", n % 250 + 1));
        }
        Ok(instance.clone())
    }

    async fn delete_instance(&self, id: &InstanceId) -> Result<()> {
        self.record(Call::Delete(id.clone()), Op::Delete)?;
        self.lock().instances.retain(|i| &i.id != id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
