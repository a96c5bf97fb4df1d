//! In-memory endpoint registry.
//!
//! Sole owner of endpoint state. Readers get cloned snapshots; every
//! mutation runs under the write lock, so a record is never observed
//! half-updated.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::{Error, Result};

struct Entry {
    seq: u64,
    endpoint: Endpoint,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

impl Inner {
    fn push(&mut self, endpoint: Endpoint) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries
            .insert(endpoint.id.clone(), Entry { seq, endpoint });
    }
}

#[derive(Clone, Default)]
pub struct EndpointRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new record. Fails if the id is already registered.
    pub async fn insert(&self, endpoint: Endpoint) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.entries.contains_key(&endpoint.id) {
            return Err(Error::DuplicateId(endpoint.id));
        }
        debug!(endpoint_id = %endpoint.id, status = %endpoint.status, "endpoint registered");
        inner.push(endpoint);
        Ok(())
    }

    /// Add a record unless its id, or its instance, is already tracked.
    ///
    /// Returns whether the record was added. Check and insert happen under
    /// one write lock.
    pub async fn insert_if_absent(&self, endpoint: Endpoint) -> bool {
        let mut inner = self.inner.write().await;
        if inner.entries.contains_key(&endpoint.id) {
            return false;
        }
        if let Some(instance_id) = &endpoint.instance_id
            && inner
                .entries
                .values()
                .any(|e| e.endpoint.instance_id.as_ref() == Some(instance_id))
        {
            return false;
        }
        inner.push(endpoint);
        true
    }

    pub async fn get(&self, id: &str) -> Option<Endpoint> {
        self.inner
            .read()
            .await
            .entries
            .get(id)
            .map(|e| e.endpoint.clone())
    }

    /// All records in registration order, whatever their status.
    pub async fn list(&self) -> Vec<Endpoint> {
        let inner = self.inner.read().await;
        let mut entries: Vec<&Entry> = inner.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.endpoint.clone()).collect()
    }

    /// Apply `f` to the stored record under exclusive access.
    pub async fn update<R>(&self, id: &str, f: impl FnOnce(&mut Endpoint) -> R) -> Result<R> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .entries
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(f(&mut entry.endpoint))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
