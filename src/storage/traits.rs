use crate::storage::batch::Batch;
use crate::utils::Result;

/// Visitor passed to [`Store::for_each`]. Returning an error stops the scan.
pub type Visitor<'a> = dyn FnMut(&[u8], &[u8]) -> Result<()> + 'a;

/// On-disk footprint of a store, in bytes.
///
/// `primary` is the main data (sst files, the database file, ...), `log` is a
/// separate write-ahead/value log. Engines without a separate log report 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreSize {
    pub primary: u64,
    pub log: u64,
}

impl StoreSize {
    pub fn total(&self) -> u64 {
        self.primary + self.log
    }
}

/// Core key-value store trait (synchronous).
///
/// Every engine adapter implements this; callers normally use it through
/// [`crate::storage::StoreHandle`].
pub trait Store: Send + Sync {
    /// Registry name of the engine backing this store.
    fn engine(&self) -> &'static str;

    /// Upsert a key. With `sync` the write is durable when this returns.
    fn set(&self, key: &[u8], value: &[u8], sync: bool) -> Result<()>;

    /// `Ok(None)` when the key is absent. A present empty value is `Some(vec![])`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &[u8], sync: bool) -> Result<()>;

    /// Check existence
    fn has(&self, key: &[u8]) -> Result<bool>;

    /// Visit every entry in key order.
    fn for_each(&self, visit: &mut Visitor<'_>) -> Result<()>;

    /// Apply every op of `batch` atomically, in staging order.
    fn write_batch(&self, batch: &Batch, sync: bool) -> Result<()>;

    /// Make everything written so far durable.
    fn flush(&self) -> Result<()>;

    fn size(&self) -> Result<StoreSize>;

    /// Path of the engine's log file, or "" when the engine has none to name.
    fn wal_name(&self) -> String;

    /// Release engine resources.
    fn close(self: Box<Self>) -> Result<()>;
}
