//! Store handle: an open engine plus at most one staged batch.

use tracing::{debug, info};

use crate::storage::batch::Batch;
use crate::storage::traits::{Store, StoreSize};
use crate::utils::metrics::{MetricsRegistry, METRICS};
use crate::utils::{Result, StoreError};

/// An open store as returned by [`Registry::open`](crate::storage::Registry::open).
///
/// Wraps the engine adapter, records per-engine operation counters, and holds
/// the single "current" batch used by [`new_batch`](Self::new_batch) /
/// [`write`](Self::write). Standalone [`Batch`] values can be committed with
/// [`write_batch`](Self::write_batch) independently of it.
pub struct StoreHandle {
    store: Box<dyn Store>,
    batch: Option<Batch>,
    metrics: MetricsRegistry,
}

impl StoreHandle {
    pub fn new(store: Box<dyn Store>) -> Self {
        Self::with_metrics(store, METRICS.clone())
    }

    pub fn with_metrics(store: Box<dyn Store>, metrics: MetricsRegistry) -> Self {
        Self { store, batch: None, metrics }
    }

    fn record(&self, op: &str) {
        self.metrics.inc_counter(&format!("{}.{}", self.store.engine(), op));
    }

    pub fn engine(&self) -> &'static str {
        self.store.engine()
    }

    pub fn set(&self, key: &[u8], value: &[u8], sync: bool) -> Result<()> {
        self.record("set");
        self.store.set(key, value, sync)
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.record("get");
        self.store.get(key)
    }

    pub fn delete(&self, key: &[u8], sync: bool) -> Result<()> {
        self.record("delete");
        self.store.delete(key, sync)
    }

    pub fn has(&self, key: &[u8]) -> Result<bool> {
        self.record("has");
        self.store.has(key)
    }

    /// Visit every entry in key order; the first error from `visit` or the
    /// engine ends the scan and is returned.
    pub fn for_each<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        self.record("for_each");
        self.store.for_each(&mut visit)
    }

    pub fn flush(&self) -> Result<()> {
        self.record("flush");
        self.store.flush()
    }

    pub fn size(&self) -> Result<StoreSize> {
        let size = self.store.size()?;
        let engine = self.store.engine();
        self.metrics.set_gauge(&format!("{}.size.primary", engine), size.primary as f64);
        self.metrics.set_gauge(&format!("{}.size.log", engine), size.log as f64);
        Ok(size)
    }

    pub fn wal_name(&self) -> String {
        self.store.wal_name()
    }

    /// Start a fresh current batch, discarding any uncommitted one.
    pub fn new_batch(&mut self) -> Result<()> {
        if let Some(old) = self.batch.replace(Batch::new()) {
            if !old.is_empty() {
                debug!(engine = self.engine(), ops = old.len(), "discarded uncommitted batch");
            }
        }
        Ok(())
    }

    pub fn batch_set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.batch.as_mut().ok_or(StoreError::NoActiveBatch)?.set(key, value);
        Ok(())
    }

    pub fn batch_delete(&mut self, key: &[u8]) -> Result<()> {
        self.batch.as_mut().ok_or(StoreError::NoActiveBatch)?.delete(key);
        Ok(())
    }

    /// Apply the current batch atomically. The batch is consumed either way;
    /// call [`new_batch`](Self::new_batch) before staging more.
    pub fn write(&mut self, sync: bool) -> Result<()> {
        let batch = self.batch.take().ok_or(StoreError::NoActiveBatch)?;
        self.write_batch(&batch, sync)
    }

    /// Drop the current batch without applying it.
    pub fn batch_close(&mut self) -> Result<()> {
        self.batch = None;
        Ok(())
    }

    /// Number of ops staged in the current batch, if one is open.
    pub fn pending(&self) -> Option<usize> {
        self.batch.as_ref().map(Batch::len)
    }

    /// Apply a standalone batch atomically.
    pub fn write_batch(&self, batch: &Batch, sync: bool) -> Result<()> {
        self.record("write_batch");
        self.metrics.add_counter(&format!("{}.batch_ops", self.engine()), batch.len() as u64);
        self.store.write_batch(batch, sync)
    }

    /// Close the store, releasing engine resources.
    pub fn close(self) -> Result<()> {
        let engine = self.store.engine();
        self.store.close()?;
        info!(engine, "store closed");
        Ok(())
    }
}
