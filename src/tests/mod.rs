//! Cross-engine tests.
//!
//! - contract: the shared behavioral suite run against every engine
//! - registry: selection, env override and custom registration

pub mod registry;
