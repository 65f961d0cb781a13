//! Engine registry and selector.
//!
//! A [`Registry`] maps engine names to constructors. It is an ordinary value:
//! build one at startup, register any custom engines, then share it by
//! reference with whoever needs to open stores.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::storage::config::EngineOptions;
use crate::storage::fjall_store::FjallKvStore;
use crate::storage::handle::StoreHandle;
use crate::storage::redb_store::RedbKvStore;
use crate::storage::sled_store::{self, SledKvStore};
use crate::storage::traits::Store;
use crate::utils::{Result, StoreError};

#[cfg(feature = "rocksdb")]
use crate::storage::rocksdb_store::RocksKvStore;

/// Engine used when neither the caller nor the environment names one.
pub const DEFAULT_ENGINE: &str = sled_store::ENGINE;

/// Environment variable consulted when no engine is passed explicitly.
pub const ENGINE_ENV: &str = "store_engine";

/// Constructor opening (or creating) a store at a path.
pub type OpenFn = Arc<dyn Fn(&Path) -> Result<Box<dyn Store>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Registry {
    engines: HashMap<String, OpenFn>,
}

impl Registry {
    /// Empty registry, no engines.
    pub fn new() -> Self {
        Self::default()
    }

    /// All compiled-in engines with default options.
    pub fn with_builtins() -> Self {
        Self::with_options(&EngineOptions::default())
    }

    /// All compiled-in engines, each capturing its part of `opts`.
    pub fn with_options(opts: &EngineOptions) -> Self {
        let mut reg = Self::new();

        let sled_opts = opts.sled.clone();
        reg.register(sled_store::ENGINE, move |path: &Path| {
            let s = SledKvStore::open_with_options(path, &sled_opts)?;
            Ok(Box::new(s) as Box<dyn Store>)
        });

        let redb_opts = opts.redb.clone();
        reg.register(crate::storage::redb_store::ENGINE, move |path: &Path| {
            let s = RedbKvStore::open_with_options(path, &redb_opts)?;
            Ok(Box::new(s) as Box<dyn Store>)
        });

        let fjall_opts = opts.fjall.clone();
        reg.register(crate::storage::fjall_store::ENGINE, move |path: &Path| {
            let s = FjallKvStore::open_with_options(path, &fjall_opts)?;
            Ok(Box::new(s) as Box<dyn Store>)
        });

        #[cfg(feature = "rocksdb")]
        {
            let rocks_opts = opts.rocksdb.clone();
            reg.register(crate::storage::rocksdb_store::ENGINE, move |path: &Path| {
                let s = RocksKvStore::open_with_options(path, &rocks_opts)?;
                Ok(Box::new(s) as Box<dyn Store>)
            });
        }

        reg
    }

    /// Register an engine. An existing entry with the same name is replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, open: F)
    where
        F: Fn(&Path) -> Result<Box<dyn Store>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.engines.insert(name.clone(), Arc::new(open)).is_some() {
            debug!(engine = %name, "replaced store engine");
        } else {
            debug!(engine = %name, "registered store engine");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    /// Registered engine names, sorted.
    pub fn engines(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }

    /// Open a store at `path`.
    ///
    /// The engine is `engine` if given and non-empty, else the value of the
    /// `store_engine` environment variable, else [`DEFAULT_ENGINE`].
    pub fn open(&self, path: impl AsRef<Path>, engine: Option<&str>) -> Result<StoreHandle> {
        let env = std::env::var(ENGINE_ENV).ok();
        let name = resolve_engine_name(engine, env.as_deref());
        self.open_engine(path, &name)
    }

    /// Open a store with exactly the named engine, skipping name resolution.
    pub fn open_engine(&self, path: impl AsRef<Path>, name: &str) -> Result<StoreHandle> {
        let path = path.as_ref();
        let open = self
            .engines
            .get(name)
            .ok_or_else(|| StoreError::UnsupportedEngine(name.to_string()))?;
        info!(engine = %name, path = %path.display(), "opening store");
        let store = open(path)?;
        Ok(StoreHandle::new(store))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("engines", &self.engines()).finish()
    }
}

/// Pick the engine name: explicit, then environment, then [`DEFAULT_ENGINE`].
/// Empty strings count as unset.
pub fn resolve_engine_name(explicit: Option<&str>, env: Option<&str>) -> String {
    explicit
        .filter(|s| !s.is_empty())
        .or_else(|| env.filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_ENGINE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        assert_eq!(resolve_engine_name(Some("redb"), Some("rocksdb")), "redb");
        assert_eq!(resolve_engine_name(Some(""), Some("rocksdb")), "rocksdb");
        assert_eq!(resolve_engine_name(None, Some("rocksdb")), "rocksdb");
        assert_eq!(resolve_engine_name(None, Some("")), DEFAULT_ENGINE);
        assert_eq!(resolve_engine_name(None, None), "sled");
    }

    #[test]
    fn test_builtins() {
        let reg = Registry::with_builtins();
        assert!(reg.contains("sled"));
        assert!(reg.contains("redb"));
        assert!(reg.contains("fjall"));
        assert_eq!(reg.contains("rocksdb"), cfg!(feature = "rocksdb"));
        assert!(!Registry::new().contains("sled"));
        assert!(format!("{:?}", reg).contains("redb"));
    }

    #[test]
    fn test_three_engines_without_features() {
        let mut names = Registry::with_builtins().engines();
        names.retain(|n| n != "rocksdb");
        assert_eq!(names, vec!["fjall", "redb", "sled"]);
    }

    #[test]
    fn test_unknown_engine_is_named() {
        let dir = tempfile::tempdir().unwrap();
        let err = Registry::with_builtins().open(dir.path().join("x"), Some("nope")).err().unwrap();
        assert!(matches!(err, StoreError::UnsupportedEngine(ref n) if n == "nope"));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_register_overwrites() {
        let mut reg = Registry::with_builtins();
        // alias "redb" under a second name, then point "sled" at redb too
        reg.register("bolt", |p: &Path| Ok(Box::new(RedbKvStore::open(p)?) as Box<dyn Store>));
        reg.register("sled", |p: &Path| Ok(Box::new(RedbKvStore::open(p)?) as Box<dyn Store>));
        assert!(reg.engines().contains(&"bolt".to_string()));

        let dir = tempfile::tempdir().unwrap();
        let s = reg.open_engine(dir.path().join("a.db"), "sled").unwrap();
        assert_eq!(s.engine(), "redb");
        s.close().unwrap();
    }

    #[test]
    fn test_constructor_error_passes_through() {
        let mut reg = Registry::new();
        reg.register("broken", |p: &Path| Err(StoreError::open("broken", p, "no disk")));
        let err = reg.open_engine("/nonexistent", "broken").err().unwrap();
        assert!(matches!(err, StoreError::Open { engine: "broken", .. }));
    }
}
