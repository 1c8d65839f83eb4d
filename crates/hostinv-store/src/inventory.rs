//! Host inventory operations on top of a store

use hostinv_core::{AttributeValue, Attributes, Filter, HostRecord, apply, validate_field_name};
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::traits::{HostStore, VersionedHost};

/// Read-modify-write attempts before giving up with [`StoreError::Conflict`]
const MAX_ATTEMPTS: u32 = 5;

/// Create, modify, remove and query hosts held in a [`HostStore`]
///
/// Owns its store; dropping the inventory releases the connection.
#[derive(Debug)]
pub struct Inventory<S> {
    store: S,
}

impl<S: HostStore> Inventory<S> {
    /// Wrap a store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwrap the store
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Add a new host
    ///
    /// # Errors
    /// Returns [`StoreError::AlreadyExists`] if the host is present, or a
    /// data error for a blank host name.
    #[instrument(skip(self, attributes), fields(store = self.store.store_type()))]
    pub async fn create_host(&self, name: &str, attributes: Attributes) -> Result<HostRecord> {
        let record = HostRecord::new(name, attributes)?;
        if !self
            .store
            .put_if_absent(&record.name, &record.attributes)
            .await?
        {
            return Err(StoreError::AlreadyExists(record.name));
        }
        info!(fields = record.attributes.len(), "host created");
        Ok(record)
    }

    /// Insert or overwrite one attribute of an existing host
    ///
    /// Other attributes written concurrently are kept: the write only lands
    /// if the host is unchanged since it was read, and is retried otherwise.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the host does not exist and
    /// [`StoreError::Conflict`] if it kept changing.
    #[instrument(skip(self, value), fields(store = self.store.store_type()))]
    pub async fn update_field(
        &self,
        name: &str,
        field: &str,
        value: AttributeValue,
    ) -> Result<HostRecord> {
        let field = validate_field_name(field.to_string())?;
        let (record, previous) = self
            .modify(name, |record| Ok(record.set(field.clone(), value.clone())?))
            .await?;
        info!(replaced = previous.is_some(), "attribute updated");
        Ok(record)
    }

    /// Remove one attribute from a host
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the host does not exist,
    /// [`StoreError::FieldNotFound`] if it lacks the attribute and
    /// [`StoreError::Conflict`] if it kept changing.
    #[instrument(skip(self), fields(store = self.store.store_type()))]
    pub async fn unset_field(&self, name: &str, field: &str) -> Result<HostRecord> {
        let (record, ()) = self
            .modify(name, |record| match record.remove(field) {
                Some(_) => Ok(()),
                None => Err(StoreError::FieldNotFound {
                    host: record.name.clone(),
                    field: field.to_string(),
                }),
            })
            .await?;
        info!("attribute removed");
        Ok(record)
    }

    /// Apply `change` to the current record and write it back, guarded by
    /// the revision that was read
    async fn modify<T, F>(&self, name: &str, mut change: F) -> Result<(HostRecord, T)>
    where
        F: FnMut(&mut HostRecord) -> Result<T>,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            let VersionedHost {
                mut record,
                revision,
            } = self.store.get_versioned(name).await?;
            let outcome = change(&mut record)?;
            if self
                .store
                .put_if_unmodified(&record.name, &record.attributes, revision)
                .await?
            {
                return Ok((record, outcome));
            }
            debug!(attempt, revision, "host changed since read, retrying");
        }
        Err(StoreError::Conflict {
            host: name.to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }

    /// Delete a host
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the host does not exist.
    #[instrument(skip(self), fields(store = self.store.store_type()))]
    pub async fn remove_host(&self, name: &str) -> Result<()> {
        self.store.delete(name).await?;
        info!("host removed");
        Ok(())
    }

    /// Fetch one host
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the host does not exist.
    #[instrument(skip(self), fields(store = self.store.store_type()))]
    pub async fn show_host(&self, name: &str) -> Result<HostRecord> {
        self.store.get(name).await
    }

    /// Fetch every host, keeping those matching `filter`
    ///
    /// The fetch completes before filtering starts. An evaluation error
    /// aborts the whole listing.
    ///
    /// # Errors
    /// Returns store errors from the fetch and [`StoreError::Filter`] if the
    /// filter cannot be evaluated.
    #[instrument(
        skip(self, filter),
        fields(store = self.store.store_type(), filter = filter.map(Filter::source))
    )]
    pub async fn list_hosts(&self, filter: Option<&Filter>) -> Result<Vec<HostRecord>> {
        let records = self.store.list().await?;
        let fetched = records.len();
        let selected = apply(records, filter)?;
        info!(fetched, selected = selected.len(), "hosts listed");
        Ok(selected)
    }
}
