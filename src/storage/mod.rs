//! Storage module: one key-value interface over several embedded engines.
//!
//! Engines: sled (default), redb, fjall, RocksDB (feature "rocksdb-db").
//! Use `storage::open(path, engine)` or a [`Registry`] to get a [`StoreHandle`].

pub mod traits;
pub mod batch;
pub mod config;
pub mod handle;
pub mod registry;
pub mod sled_store;
pub mod redb_store;
pub mod fjall_store;

#[cfg(feature = "rocksdb")]
pub mod rocksdb_store;

pub use traits::{Store, StoreSize, Visitor};
pub use batch::{Batch, BatchOp};
pub use config::{EngineOptions, FjallOptions, RedbOptions, RocksOptions, SledOptions, StoreConfig};
pub use handle::StoreHandle;
pub use registry::{resolve_engine_name, OpenFn, Registry, DEFAULT_ENGINE, ENGINE_ENV};
pub use sled_store::SledKvStore;
pub use redb_store::RedbKvStore;
pub use fjall_store::FjallKvStore;

#[cfg(feature = "rocksdb")]
pub use rocksdb_store::RocksKvStore;

use std::path::Path;
use crate::utils::Result;

/// Open a store with the built-in engines. `engine` of `None` or `""` defers
/// to the `store_engine` env var and then [`DEFAULT_ENGINE`].
pub fn open(path: impl AsRef<Path>, engine: Option<&str>) -> Result<StoreHandle> {
    Registry::with_builtins().open(path, engine)
}
