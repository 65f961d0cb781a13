//! fjall-backed store, the always-available LSM engine besides sled.
//!
//! All keys live in one partition opened (or created) at startup. fjall writes
//! a journal next to its segment files; [`Store::size`] reports segments as
//! primary bytes and everything else under the directory as log bytes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use tracing::{debug, info, trace};

use crate::storage::batch::{Batch, BatchOp};
use crate::storage::config::FjallOptions;
use crate::storage::traits::{Store, StoreSize, Visitor};
use crate::utils::disk::dir_bytes;
use crate::utils::logging::fmt_key;
use crate::utils::{Result, StoreError};

pub const ENGINE: &str = "fjall";

const PARTITION: &str = "store";

/// Longest key fjall accepts.
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

pub struct FjallKvStore {
    keyspace: Keyspace,
    items: PartitionHandle,
    path: PathBuf,
}

impl FjallKvStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &FjallOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, opts: &FjallOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut cfg = Config::new(path);
        if let Some(bytes) = opts.cache_size {
            cfg = cfg.cache_size(bytes);
        }
        let keyspace = cfg.open().map_err(|e| StoreError::open(ENGINE, path, e))?;
        let items = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .map_err(|e| StoreError::open(ENGINE, path, e))?;
        info!(path = %path.display(), "opened fjall store");
        Ok(Self { keyspace, items, path: path.to_path_buf() })
    }

    fn sync_if(&self, sync: bool) -> Result<()> {
        if sync {
            self.keyspace.persist(PersistMode::SyncAll)?;
        }
        Ok(())
    }
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StoreError::InvalidKey(format!(
            "fjall keys must be 1..={} bytes, got {}",
            MAX_KEY_LEN,
            key.len()
        )));
    }
    Ok(())
}

fn storable(key: &[u8]) -> bool {
    check_key(key).is_ok()
}

impl Store for FjallKvStore {
    fn engine(&self) -> &'static str {
        ENGINE
    }

    fn set(&self, key: &[u8], value: &[u8], sync: bool) -> Result<()> {
        check_key(key)?;
        trace!(key = %fmt_key(key), len = value.len(), sync, "fjall set");
        self.items.insert(key, value)?;
        self.sync_if(sync)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if !storable(key) {
            return Ok(None);
        }
        Ok(self.items.get(key)?.map(|v| v.to_vec()))
    }

    fn delete(&self, key: &[u8], sync: bool) -> Result<()> {
        if !storable(key) {
            return Ok(());
        }
        trace!(key = %fmt_key(key), sync, "fjall delete");
        self.items.remove(key)?;
        self.sync_if(sync)
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        if !storable(key) {
            return Ok(false);
        }
        Ok(self.items.contains_key(key)?)
    }

    fn for_each(&self, visit: &mut Visitor<'_>) -> Result<()> {
        for item in self.items.iter() {
            let (k, v) = item?;
            visit(&k[..], &v[..])?;
        }
        Ok(())
    }

    // Every entry of a fjall batch shares one sequence number, so a key staged
    // twice must be reduced to its final op before commit.
    fn write_batch(&self, batch: &Batch, sync: bool) -> Result<()> {
        let mut last: BTreeMap<&[u8], Option<&[u8]>> = BTreeMap::new();
        for op in batch.ops() {
            match op {
                BatchOp::Set { key, value } => {
                    check_key(key)?;
                    last.insert(key.as_slice(), Some(value.as_slice()));
                }
                BatchOp::Delete { key } => {
                    if storable(key) {
                        last.insert(key.as_slice(), None);
                    }
                }
            }
        }

        let mut b = self.keyspace.batch();
        for (key, value) in last {
            match value {
                Some(v) => b.insert(&self.items, key, v),
                None => b.remove(&self.items, key),
            }
        }
        b.commit()?;
        debug!(ops = batch.len(), sync, "fjall batch committed");
        self.sync_if(sync)
    }

    fn flush(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    fn size(&self) -> Result<StoreSize> {
        let primary = self.items.disk_space();
        let total = dir_bytes(&self.path, |_| true)?;
        Ok(StoreSize { primary, log: total.saturating_sub(primary) })
    }

    fn wal_name(&self) -> String {
        String::new()
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        info!(path = %self.path.display(), "closed fjall store");
        Ok(())
    }
}
