//! Utility module: errors, logging, metrics and disk accounting.

pub mod errors;
pub mod metrics;
pub mod logging;
pub(crate) mod disk;

pub use errors::{StoreError, Result};
pub use metrics::{MetricsRegistry, METRICS};
pub use logging::init_logging;
