#[cfg(feature = "rocksdb")]
use crate::storage::batch::{Batch, BatchOp};
#[cfg(feature = "rocksdb")]
use crate::storage::config::RocksOptions;
#[cfg(feature = "rocksdb")]
use crate::storage::traits::{Store, StoreSize, Visitor};
#[cfg(feature = "rocksdb")]
use crate::utils::logging::fmt_key;
#[cfg(feature = "rocksdb")]
use crate::utils::{Result, StoreError};
#[cfg(feature = "rocksdb")]
use rocksdb::{IteratorMode, Options, WriteBatch as RocksWriteBatch, WriteOptions, DB};
#[cfg(feature = "rocksdb")]
use crate::utils::disk::dir_bytes;
#[cfg(feature = "rocksdb")]
use std::path::{Path, PathBuf};
#[cfg(feature = "rocksdb")]
use tracing::{debug, info, trace};

#[cfg(feature = "rocksdb")]
pub const ENGINE: &str = "rocksdb";

#[cfg(feature = "rocksdb")]
pub struct RocksKvStore {
    db: DB,
    path: PathBuf,
}

#[cfg(feature = "rocksdb")]
impl RocksKvStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &RocksOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, ropts: &RocksOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(ropts.create_if_missing);
        if let Some(n) = ropts.max_open_files {
            opts.set_max_open_files(n);
        }
        let db = DB::open(&opts, path).map_err(|e| StoreError::open(ENGINE, path, e))?;
        info!(path = %path.display(), "opened rocksdb store");
        Ok(Self { db, path: path.to_path_buf() })
    }

    /// Bytes held in write-ahead log files (`*.log`) under the db directory.
    fn wal_bytes(&self) -> Result<u64> {
        let is_log = |p: &Path| p.extension().map_or(false, |ext| ext == "log");
        Ok(dir_bytes(&self.path, is_log)?)
    }
}

#[cfg(feature = "rocksdb")]
fn write_opts(sync: bool) -> WriteOptions {
    let mut wo = WriteOptions::default();
    wo.set_sync(sync);
    wo
}

#[cfg(feature = "rocksdb")]
impl Store for RocksKvStore {
    fn engine(&self) -> &'static str {
        ENGINE
    }

    fn set(&self, key: &[u8], value: &[u8], sync: bool) -> Result<()> {
        trace!(key = %fmt_key(key), len = value.len(), sync, "rocksdb set");
        self.db.put_opt(key, value, &write_opts(sync))?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?)
    }

    fn delete(&self, key: &[u8], sync: bool) -> Result<()> {
        trace!(key = %fmt_key(key), sync, "rocksdb delete");
        self.db.delete_opt(key, &write_opts(sync))?;
        Ok(())
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.db.get_pinned(key)?.is_some())
    }

    fn for_each(&self, visit: &mut Visitor<'_>) -> Result<()> {
        let snapshot = self.db.snapshot();
        for item in snapshot.iterator(IteratorMode::Start) {
            let (k, v) = item?;
            visit(&k[..], &v[..])?;
        }
        Ok(())
    }

    fn write_batch(&self, batch: &Batch, sync: bool) -> Result<()> {
        let mut wb = RocksWriteBatch::default();
        for op in batch.ops() {
            match op {
                BatchOp::Set { key, value } => wb.put(key, value),
                BatchOp::Delete { key } => wb.delete(key),
            }
        }
        self.db.write_opt(wb, &write_opts(sync))?;
        debug!(ops = batch.len(), sync, "rocksdb batch written");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db.flush_wal(true)?;
        self.db.flush()?;
        Ok(())
    }

    fn size(&self) -> Result<StoreSize> {
        let primary = self.db.property_int_value("rocksdb.total-sst-files-size")?.unwrap_or(0);
        Ok(StoreSize { primary, log: self.wal_bytes()? })
    }

    fn wal_name(&self) -> String {
        String::new()
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.db.flush_wal(true)?;
        info!(path = %self.path.display(), "closed rocksdb store");
        Ok(())
    }
}

#[cfg(all(test, feature = "rocksdb"))]
mod tests {
    use super::*;

    #[test]
    fn test_size_reports_sst_after_flush() {
        let dir = tempfile::tempdir().unwrap();
        let s = RocksKvStore::open(dir.path().join("rocks")).unwrap();
        for i in 0..100u32 {
            s.set(&i.to_be_bytes(), &[7u8; 128], false).unwrap();
        }
        s.flush().unwrap();
        let size = s.size().unwrap();
        assert!(size.primary > 0);
        assert_eq!(s.wal_name(), "");
    }

    #[test]
    fn test_missing_dir_without_create_fails() {
        let dir = tempfile::tempdir().unwrap();
        let opts = RocksOptions { create_if_missing: false, max_open_files: Some(32) };
        let err = RocksKvStore::open_with_options(dir.path().join("absent"), &opts).err().unwrap();
        assert!(matches!(err, StoreError::Open { engine: "rocksdb", .. }));
    }

    #[test]
    fn test_empty_key_delegates_to_engine() {
        let dir = tempfile::tempdir().unwrap();
        let s = RocksKvStore::open(dir.path().join("rocks")).unwrap();
        assert_eq!(s.get(b"").unwrap(), None);
        s.set(b"", b"root", false).unwrap();
        assert_eq!(s.get(b"").unwrap(), Some(b"root".to_vec()));
    }
}
