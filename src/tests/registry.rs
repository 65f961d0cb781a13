//! Engine selection and custom registration.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::storage::{self, Batch, BatchOp, Registry, Store, StoreSize, Visitor, ENGINE_ENV};
use crate::tests::contract::run_contract;
use crate::utils::{Result, StoreError};

/// In-memory engine used to exercise custom registration.
#[derive(Default)]
struct MemStore {
    inner: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl Store for MemStore {
    fn engine(&self) -> &'static str {
        "mem"
    }

    fn set(&self, key: &[u8], value: &[u8], _sync: bool) -> Result<()> {
        self.inner.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn delete(&self, key: &[u8], _sync: bool) -> Result<()> {
        self.inner.write().remove(key);
        Ok(())
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.inner.read().contains_key(key))
    }

    fn for_each(&self, visit: &mut Visitor<'_>) -> Result<()> {
        let snapshot = self.inner.read().clone();
        for (k, v) in &snapshot {
            visit(k.as_slice(), v.as_slice())?;
        }
        Ok(())
    }

    fn write_batch(&self, batch: &Batch, _sync: bool) -> Result<()> {
        let mut map = self.inner.write();
        for op in batch.ops() {
            match op {
                BatchOp::Set { key, value } => {
                    map.insert(key.clone(), value.clone());
                }
                BatchOp::Delete { key } => {
                    map.remove(key);
                }
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> Result<StoreSize> {
        Ok(StoreSize::default())
    }

    fn wal_name(&self) -> String {
        String::new()
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_registered_engine_passes_contract() {
    let mut reg = Registry::with_builtins();
    reg.register("mem", |_: &Path| Ok(Box::new(MemStore::default()) as Box<dyn Store>));
    assert!(reg.contains("mem"));

    let db = reg.open("/unused", Some("mem")).unwrap();
    assert_eq!(db.engine(), "mem");
    run_contract(db);
}

#[test]
fn test_unsupported_engine() {
    let dir = tempfile::tempdir().unwrap();
    let err = storage::open(dir.path().join("db"), Some("nope")).err().unwrap();
    assert!(matches!(err, StoreError::UnsupportedEngine(_)));
    assert_eq!(err.to_string(), "unsupported store engine: nope");
}

// Only test in the crate that touches the env var.
#[test]
fn test_default_and_env_override() {
    let dir = tempfile::tempdir().unwrap();

    std::env::remove_var(ENGINE_ENV);
    let db = storage::open(dir.path().join("default"), None).unwrap();
    assert_eq!(db.engine(), storage::DEFAULT_ENGINE);
    db.close().unwrap();

    std::env::set_var(ENGINE_ENV, "redb");
    let db = storage::open(dir.path().join("from-env"), Some("")).unwrap();
    assert_eq!(db.engine(), "redb");
    db.close().unwrap();

    // explicit name beats the environment
    let db = storage::open(dir.path().join("explicit"), Some("sled")).unwrap();
    assert_eq!(db.engine(), "sled");
    db.close().unwrap();

    std::env::set_var(ENGINE_ENV, "nope");
    let err = storage::open(dir.path().join("bad-env"), None).err().unwrap();
    assert!(err.to_string().contains("nope"));

    std::env::remove_var(ENGINE_ENV);
}
