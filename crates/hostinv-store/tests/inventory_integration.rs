use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use hostinv_core::{AttributeValue, Attributes, Filter, HostRecord, parse_host_data};
use hostinv_store::{HostStore, Inventory, MemoryStore, StoreError, VersionedHost};

// Mock implementations
struct UnreachableStore {
    calls: AtomicUsize,
}

#[async_trait]
impl HostStore for UnreachableStore {
    fn store_type(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _name: &str) -> hostinv_store::Result<HostRecord> {
        Err(self.fail())
    }

    async fn put(&self, _name: &str, _attributes: &Attributes) -> hostinv_store::Result<()> {
        Err(self.fail())
    }

    async fn put_if_absent(
        &self,
        _name: &str,
        _attributes: &Attributes,
    ) -> hostinv_store::Result<bool> {
        Err(self.fail())
    }

    async fn get_versioned(&self, _name: &str) -> hostinv_store::Result<VersionedHost> {
        Err(self.fail())
    }

    async fn put_if_unmodified(
        &self,
        _name: &str,
        _attributes: &Attributes,
        _revision: i64,
    ) -> hostinv_store::Result<bool> {
        Err(self.fail())
    }

    async fn delete(&self, _name: &str) -> hostinv_store::Result<()> {
        Err(self.fail())
    }

    async fn list(&self) -> hostinv_store::Result<Vec<HostRecord>> {
        Err(self.fail())
    }
}

impl UnreachableStore {
    fn fail(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Timeout {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Lets another writer touch the host right after each of the first
/// `races` reads, so the read revision is already stale
struct RacingStore {
    inner: MemoryStore,
    races: AtomicUsize,
}

#[async_trait]
impl HostStore for RacingStore {
    fn store_type(&self) -> &'static str {
        "racing"
    }

    async fn get(&self, name: &str) -> hostinv_store::Result<HostRecord> {
        self.inner.get(name).await
    }

    async fn put(&self, name: &str, attributes: &Attributes) -> hostinv_store::Result<()> {
        self.inner.put(name, attributes).await
    }

    async fn put_if_absent(
        &self,
        name: &str,
        attributes: &Attributes,
    ) -> hostinv_store::Result<bool> {
        self.inner.put_if_absent(name, attributes).await
    }

    async fn get_versioned(&self, name: &str) -> hostinv_store::Result<VersionedHost> {
        let read = self.inner.get_versioned(name).await?;
        let remaining = self.races.load(Ordering::SeqCst);
        if remaining > 0 {
            self.races.store(remaining - 1, Ordering::SeqCst);
            let mut other = read.record.attributes.clone();
            other.insert(format!("owner{remaining}"), "ops".into());
            self.inner.put(name, &other).await?;
        }
        Ok(read)
    }

    async fn put_if_unmodified(
        &self,
        name: &str,
        attributes: &Attributes,
        revision: i64,
    ) -> hostinv_store::Result<bool> {
        self.inner.put_if_unmodified(name, attributes, revision).await
    }

    async fn delete(&self, name: &str) -> hostinv_store::Result<()> {
        self.inner.delete(name).await
    }

    async fn list(&self) -> hostinv_store::Result<Vec<HostRecord>> {
        self.inner.list().await
    }
}

async fn racing(races: usize) -> Inventory<RacingStore> {
    let inventory = Inventory::new(RacingStore {
        inner: MemoryStore::new(),
        races: AtomicUsize::new(races),
    });
    inventory
        .create_host("web01", parse_host_data("cores=4").unwrap())
        .await
        .unwrap();
    inventory
}

async fn seeded() -> Inventory<MemoryStore> {
    let inventory = Inventory::new(MemoryStore::new());
    for (name, data) in [
        ("ams-web01", "processor=intel cores=8 site=AMS monitored=true"),
        ("ams-db01", r#"{"processor": "amd", "cores": 32, "site": "AMS"}"#),
        ("ein-web01", "<host><processor>intel</processor><cores>2</cores><site>EIN</site></host>"),
        ("fra-web01", "processor=intel cores=16 site=FRA"),
    ] {
        inventory
            .create_host(name, parse_host_data(data).unwrap())
            .await
            .unwrap();
    }
    inventory
}

fn names(records: &[HostRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn test_list_without_filter_returns_key_order() {
    let inventory = seeded().await;
    let hosts = inventory.list_hosts(None).await.unwrap();
    assert_eq!(
        names(&hosts),
        vec!["ams-db01", "ams-web01", "ein-web01", "fra-web01"]
    );
}

#[tokio::test]
async fn test_list_with_filter() {
    let inventory = seeded().await;
    let filter = Filter::compile("processor=='intel' && cores>=4").unwrap();
    let hosts = inventory.list_hosts(Some(&filter)).await.unwrap();
    assert_eq!(names(&hosts), vec!["ams-web01", "fra-web01"]);

    let filter = Filter::compile("site=='AMS' || site=='EIN'").unwrap();
    let hosts = inventory.list_hosts(Some(&filter)).await.unwrap();
    assert_eq!(names(&hosts), vec!["ams-db01", "ams-web01", "ein-web01"]);
}

#[tokio::test]
async fn test_list_empty_inventory() {
    let inventory = Inventory::new(MemoryStore::new());
    let filter = Filter::compile("cores>=4").unwrap();
    assert!(inventory.list_hosts(Some(&filter)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_then_filter_sees_new_value() {
    let inventory = seeded().await;
    inventory
        .update_field("ein-web01", "cores", AttributeValue::Integer(12))
        .await
        .unwrap();

    let filter = Filter::compile("site=='EIN' && cores>4").unwrap();
    let hosts = inventory.list_hosts(Some(&filter)).await.unwrap();
    assert_eq!(names(&hosts), vec!["ein-web01"]);
}

#[tokio::test]
async fn test_remove_host() {
    let inventory = seeded().await;
    inventory.remove_host("fra-web01").await.unwrap();
    assert!(inventory.show_host("fra-web01").await.unwrap_err().is_not_found());
    assert!(inventory.remove_host("fra-web01").await.unwrap_err().is_not_found());
    assert_eq!(inventory.store().len().await, 3);
}

#[tokio::test]
async fn test_store_failure_is_terminal() {
    let inventory = Inventory::new(UnreachableStore {
        calls: AtomicUsize::new(0),
    });
    let err = inventory.list_hosts(None).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(inventory.store().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_write_is_not_lost() {
    let inventory = racing(2).await;
    let record = inventory
        .update_field("web01", "site", "AMS".into())
        .await
        .unwrap();

    // Both competing writes and the update survive
    let stored = inventory.show_host("web01").await.unwrap();
    assert_eq!(stored, record);
    for field in ["cores", "owner1", "owner2", "site"] {
        assert!(stored.get(field).is_some(), "{field} missing: {stored:?}");
    }
}

#[tokio::test]
async fn test_unset_retries_on_concurrent_write() {
    let inventory = racing(1).await;
    let record = inventory.unset_field("web01", "cores").await.unwrap();
    assert_eq!(record.get("owner1"), Some(&AttributeValue::from("ops")));
    assert!(record.get("cores").is_none());
}

#[tokio::test]
async fn test_constant_contention_gives_up() {
    let inventory = racing(usize::MAX).await;
    let err = inventory
        .update_field("web01", "site", "AMS".into())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, StoreError::Conflict { host, attempts: 5 } if host == "web01"),
        "{err:?}"
    );
    assert!(err.is_retryable());
    assert!(inventory.show_host("web01").await.unwrap().get("site").is_none());
}
