//! redb-backed store.
//!
//! redb keeps everything in one copy-on-write B-tree file. All keys live in a
//! single table that is created on open if it does not exist yet, and the
//! database file itself is what [`Store::wal_name`] reports.

use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info, trace};

use crate::storage::batch::{Batch, BatchOp};
use crate::storage::config::RedbOptions;
use crate::storage::traits::{Store, StoreSize, Visitor};
use crate::utils::logging::fmt_key;
use crate::utils::{Result, StoreError};

pub const ENGINE: &str = "redb";

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("store");

macro_rules! from_redb_error {
    ($($err:ty),*) => {
        $(impl From<$err> for StoreError {
            fn from(e: $err) -> Self {
                StoreError::Redb(redb::Error::from(e))
            }
        })*
    };
}

from_redb_error!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError
);

pub struct RedbKvStore {
    db: Database,
    path: PathBuf,
}

impl RedbKvStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &RedbOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, opts: &RedbOptions) -> Result<Self> {
        let path = path.as_ref();
        let mut builder = Database::builder();
        if let Some(cache_size) = opts.cache_size {
            builder.set_cache_size(cache_size);
        }
        let db = builder.create(path).map_err(|e| StoreError::open(ENGINE, path, e))?;
        create_table(&db).map_err(|e| StoreError::open(ENGINE, path, e))?;

        info!(path = %path.display(), "opened redb store");
        Ok(Self { db, path: path.to_path_buf() })
    }
}

fn create_table(db: &Database) -> std::result::Result<(), redb::Error> {
    let txn = db.begin_write()?;
    txn.open_table(TABLE)?;
    txn.commit()?;
    Ok(())
}

impl Store for RedbKvStore {
    fn engine(&self) -> &'static str {
        ENGINE
    }

    // Commits are always durable in redb, so `sync` needs no extra work.
    fn set(&self, key: &[u8], value: &[u8], sync: bool) -> Result<()> {
        trace!(key = %fmt_key(key), len = value.len(), sync, "redb set");
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn delete(&self, key: &[u8], sync: bool) -> Result<()> {
        trace!(key = %fmt_key(key), sync, "redb delete");
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        let found = table.get(key)?.is_some();
        Ok(found)
    }

    fn for_each(&self, visit: &mut Visitor<'_>) -> Result<()> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        for item in table.iter()? {
            let (k, v) = item?;
            visit(k.value(), v.value())?;
        }
        Ok(())
    }

    fn write_batch(&self, batch: &Batch, sync: bool) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TABLE)?;
            for op in batch.ops() {
                match op {
                    BatchOp::Set { key, value } => {
                        table.insert(key.as_slice(), value.as_slice())?;
                    }
                    BatchOp::Delete { key } => {
                        table.remove(key.as_slice())?;
                    }
                }
            }
        }
        txn.commit()?;
        debug!(ops = batch.len(), sync, "redb batch committed");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn size(&self) -> Result<StoreSize> {
        let primary = fs::metadata(&self.path)?.len();
        Ok(StoreSize { primary, log: 0 })
    }

    fn wal_name(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn close(self: Box<Self>) -> Result<()> {
        let RedbKvStore { db, path } = *self;
        drop(db);
        info!(path = %path.display(), "closed redb store");
        Ok(())
    }
}
