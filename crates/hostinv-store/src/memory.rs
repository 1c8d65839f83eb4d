//! In-process store

use std::collections::BTreeMap;

use async_trait::async_trait;
use hostinv_core::{Attributes, HostRecord};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::traits::{HostStore, VersionedHost};

/// Store backed by a sorted map, for tests and offline use
///
/// Like etcd, every write bumps one store-wide revision and stamps it on
/// the written entry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    revision: i64,
    hosts: BTreeMap<String, Entry>,
}

#[derive(Debug)]
struct Entry {
    attributes: Attributes,
    revision: i64,
}

impl State {
    fn write(&mut self, name: &str, attributes: &Attributes) {
        self.revision += 1;
        self.hosts.insert(
            name.to_string(),
            Entry {
                attributes: attributes.clone(),
                revision: self.revision,
            },
        );
    }
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`
    pub fn with_hosts(records: impl IntoIterator<Item = HostRecord>) -> Self {
        let mut state = State::default();
        for record in records {
            state.write(&record.name, &record.attributes);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Number of stored hosts
    pub async fn len(&self) -> usize {
        self.state.read().await.hosts.len()
    }

    /// Check if the store holds no hosts
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.hosts.is_empty()
    }
}

#[async_trait]
impl HostStore for MemoryStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    #[instrument(skip(self), level = "debug")]
    async fn get(&self, name: &str) -> Result<HostRecord> {
        Ok(self.get_versioned(name).await?.record)
    }

    #[instrument(skip(self, attributes), level = "debug")]
    async fn put(&self, name: &str, attributes: &Attributes) -> Result<()> {
        self.state.write().await.write(name, attributes);
        Ok(())
    }

    #[instrument(skip(self, attributes), level = "debug")]
    async fn put_if_absent(&self, name: &str, attributes: &Attributes) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.hosts.contains_key(name) {
            debug!("host already present");
            return Ok(false);
        }
        state.write(name, attributes);
        Ok(true)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_versioned(&self, name: &str) -> Result<VersionedHost> {
        let state = self.state.read().await;
        let entry = state
            .hosts
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        Ok(VersionedHost {
            record: HostRecord::new(name, entry.attributes.clone())?,
            revision: entry.revision,
        })
    }

    #[instrument(skip(self, attributes), level = "debug")]
    async fn put_if_unmodified(
        &self,
        name: &str,
        attributes: &Attributes,
        revision: i64,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.hosts.get(name).map(|entry| entry.revision) != Some(revision) {
            debug!("host modified since read");
            return Ok(false);
        }
        state.write(name, attributes);
        Ok(true)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, name: &str) -> Result<()> {
        self.state
            .write()
            .await
            .hosts
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    #[instrument(skip(self), level = "debug")]
    async fn list(&self) -> Result<Vec<HostRecord>> {
        let state = self.state.read().await;
        let records = state
            .hosts
            .iter()
            .map(|(name, entry)| HostRecord::new(name.clone(), entry.attributes.clone()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "listed hosts");
        Ok(records)
    }
}
