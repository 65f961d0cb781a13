//! sled-backed store (the default engine).

use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::storage::batch::{Batch, BatchOp};
use crate::storage::config::SledOptions;
use crate::storage::traits::{Store, StoreSize, Visitor};
use crate::utils::logging::fmt_key;
use crate::utils::{Result, StoreError};

pub const ENGINE: &str = "sled";

pub struct SledKvStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledKvStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &SledOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, opts: &SledOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut cfg = sled::Config::new().path(path);
        if let Some(cap) = opts.cache_capacity {
            cfg = cfg.cache_capacity(cap);
        }
        if let Some(ms) = opts.flush_every_ms {
            cfg = cfg.flush_every_ms(if ms == 0 { None } else { Some(ms) });
        }
        let db = cfg.open().map_err(|e| StoreError::open(ENGINE, path, e))?;
        info!(path = %path.display(), recovered = db.was_recovered(), "opened sled store");
        Ok(Self { db, path: path.to_path_buf() })
    }

    fn sync_if(&self, sync: bool) -> Result<()> {
        if sync {
            self.db.flush()?;
        }
        Ok(())
    }
}

impl Store for SledKvStore {
    fn engine(&self) -> &'static str {
        ENGINE
    }

    fn set(&self, key: &[u8], value: &[u8], sync: bool) -> Result<()> {
        trace!(key = %fmt_key(key), len = value.len(), sync, "sled set");
        self.db.insert(key, value)?;
        self.sync_if(sync)
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    fn delete(&self, key: &[u8], sync: bool) -> Result<()> {
        trace!(key = %fmt_key(key), sync, "sled delete");
        self.db.remove(key)?;
        self.sync_if(sync)
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.db.contains_key(key)?)
    }

    fn for_each(&self, visit: &mut Visitor<'_>) -> Result<()> {
        for item in self.db.iter() {
            let (k, v) = item?;
            visit(&k[..], &v[..])?;
        }
        Ok(())
    }

    fn write_batch(&self, batch: &Batch, sync: bool) -> Result<()> {
        let mut b = sled::Batch::default();
        for op in batch.ops() {
            match op {
                BatchOp::Set { key, value } => b.insert(key.as_slice(), value.as_slice()),
                BatchOp::Delete { key } => b.remove(key.as_slice()),
            }
        }
        self.db.apply_batch(b)?;
        debug!(ops = batch.len(), sync, "sled batch applied");
        self.sync_if(sync)
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn size(&self) -> Result<StoreSize> {
        Ok(StoreSize { primary: self.db.size_on_disk()?, log: 0 })
    }

    fn wal_name(&self) -> String {
        String::new()
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.db.flush()?;
        info!(path = %self.path.display(), "closed sled store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_write_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sled");
        {
            let s = Box::new(SledKvStore::open(&path).unwrap());
            s.set(b"key1", b"value1", true).unwrap();
            s.close().unwrap();
        }
        let s = SledKvStore::open(&path).unwrap();
        assert_eq!(s.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(s.wal_name(), "");
    }

    #[test]
    fn test_options_applied() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SledOptions { cache_capacity: Some(1 << 20), flush_every_ms: Some(0) };
        let s = SledKvStore::open_with_options(dir.path().join("sled"), &opts).unwrap();
        s.set(b"a", b"b", false).unwrap();
        s.flush().unwrap();
        assert!(s.size().unwrap().primary > 0);
        assert_eq!(s.size().unwrap().log, 0);
    }
}
