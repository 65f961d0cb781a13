//! polystore: a uniform key-value facade over embedded storage engines.
//!
//! ```no_run
//! use polystore::storage;
//!
//! # fn main() -> polystore::Result<()> {
//! let mut db = storage::open("./data/store", Some("redb"))?;
//! db.set(b"key1", b"value1", false)?;
//! assert_eq!(db.get(b"key1")?, Some(b"value1".to_vec()));
//!
//! db.new_batch()?;
//! db.batch_set(b"k1", b"v1")?;
//! db.batch_delete(b"key1")?;
//! db.write(true)?;
//! db.close()?;
//! # Ok(())
//! # }
//! ```

pub mod storage;
pub mod utils;

pub use storage::{open, Batch, Registry, Store, StoreConfig, StoreHandle, StoreSize};
pub use utils::{Result, StoreError};

#[cfg(test)]
mod tests;
