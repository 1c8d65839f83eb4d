//! Store adapter trait

use async_trait::async_trait;
use hostinv_core::{Attributes, HostRecord};

use crate::error::Result;

/// A host together with the store revision that last modified it
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedHost {
    pub record: HostRecord,
    /// Opaque, increases on every write to the entry
    pub revision: i64,
}

/// Persistent mapping from host name to attributes
///
/// Implementations apply their own timeouts and report connectivity
/// problems as [`StoreError::Unavailable`](crate::StoreError::Unavailable)
/// or [`StoreError::Timeout`](crate::StoreError::Timeout).
#[async_trait]
pub trait HostStore: Send + Sync {
    /// Short name used in logs
    fn store_type(&self) -> &'static str;

    /// Fetch one host; `NotFound` if absent
    async fn get(&self, name: &str) -> Result<HostRecord>;

    /// Create or overwrite a host
    async fn put(&self, name: &str, attributes: &Attributes) -> Result<()>;

    /// Create a host only if absent; `false` when it already existed
    async fn put_if_absent(&self, name: &str, attributes: &Attributes) -> Result<bool>;

    /// Fetch one host with its revision; `NotFound` if absent
    async fn get_versioned(&self, name: &str) -> Result<VersionedHost>;

    /// Overwrite a host only if it is still at `revision`
    ///
    /// Returns `false` when the entry was modified or deleted since.
    async fn put_if_unmodified(
        &self,
        name: &str,
        attributes: &Attributes,
        revision: i64,
    ) -> Result<bool>;

    /// Delete a host; `NotFound` if nothing was deleted
    async fn delete(&self, name: &str) -> Result<()>;

    /// Every host, in key order
    async fn list(&self) -> Result<Vec<HostRecord>>;
}

#[async_trait]
impl<S: HostStore + ?Sized> HostStore for std::sync::Arc<S> {
    fn store_type(&self) -> &'static str {
        (**self).store_type()
    }

    async fn get(&self, name: &str) -> Result<HostRecord> {
        (**self).get(name).await
    }

    async fn put(&self, name: &str, attributes: &Attributes) -> Result<()> {
        (**self).put(name, attributes).await
    }

    async fn put_if_absent(&self, name: &str, attributes: &Attributes) -> Result<bool> {
        (**self).put_if_absent(name, attributes).await
    }

    async fn get_versioned(&self, name: &str) -> Result<VersionedHost> {
        (**self).get_versioned(name).await
    }

    async fn put_if_unmodified(
        &self,
        name: &str,
        attributes: &Attributes,
        revision: i64,
    ) -> Result<bool> {
        (**self)
            .put_if_unmodified(name, attributes, revision)
            .await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        (**self).delete(name).await
    }

    async fn list(&self) -> Result<Vec<HostRecord>> {
        (**self).list().await
    }
}
