//! hostinv-store: Storage for the host inventory
//!
//! [`HostStore`] is the boundary to the persistent store. [`EtcdStore`]
//! talks to etcd through its JSON gateway and [`MemoryStore`] keeps hosts
//! in process. [`Inventory`] implements the inventory commands on top of
//! either.

pub mod error;
pub mod etcd;
pub mod inventory;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use etcd::EtcdStore;
pub use inventory::Inventory;
pub use memory::MemoryStore;
pub use traits::{HostStore, VersionedHost};
