//! Store configuration, loadable from TOML.
//!
//! ```toml
//! path = "./data/store"
//! engine = "redb"
//!
//! [options.redb]
//! cache_size = 67108864
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::handle::StoreHandle;
use crate::storage::registry::Registry;
use crate::utils::{Result, StoreError};

/// Tuning for the sled engine.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SledOptions {
    /// Page cache size in bytes.
    pub cache_capacity: Option<u64>,
    /// Background flush interval; `0` disables background flushing.
    pub flush_every_ms: Option<u64>,
}

/// Tuning for the redb engine.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedbOptions {
    pub cache_size: Option<usize>,
}

/// Tuning for the fjall engine.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FjallOptions {
    /// Block cache size in bytes.
    pub cache_size: Option<u64>,
}

/// Tuning for the rocksdb engine.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RocksOptions {
    pub create_if_missing: bool,
    pub max_open_files: Option<i32>,
}

impl Default for RocksOptions {
    fn default() -> Self {
        Self { create_if_missing: true, max_open_files: None }
    }
}

/// Per-engine options captured by the built-in constructors.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineOptions {
    pub sled: SledOptions,
    pub redb: RedbOptions,
    pub fjall: FjallOptions,
    pub rocksdb: RocksOptions,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Engine name; falls back to `store_engine` env var, then the default engine.
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub options: EngineOptions,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), engine: None, options: EngineOptions::default() }
    }

    #[must_use]
    pub fn engine(mut self, name: impl Into<String>) -> Self {
        self.engine = Some(name.into());
        self
    }

    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Open the configured store with the built-in engines tuned by `options`.
    pub fn open(&self) -> Result<StoreHandle> {
        Registry::with_options(&self.options).open(&self.path, self.engine.as_deref())
    }
}
