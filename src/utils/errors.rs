use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for every store engine
#[derive(Error, Debug)]
pub enum StoreError {
    /// The engine could not initialize at the given path (lock held, corrupt, permission).
    #[error("failed to open {engine} store at {}: {source}", .path.display())]
    Open {
        engine: &'static str,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unsupported store engine: {0}")]
    UnsupportedEngine(String),

    #[error("no active batch, call new_batch first")]
    NoActiveBatch,

    /// Key outside the engine's accepted length range.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("rocksdb error: {0}")]
    RocksDb(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub(crate) fn open<E>(engine: &'static str, path: impl Into<PathBuf>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StoreError::Open { engine, path: path.into(), source: source.into() }
    }
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for StoreError {
    fn from(e: rocksdb::Error) -> Self {
        StoreError::RocksDb(Box::new(e))
    }
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, StoreError>;
