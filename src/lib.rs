//! confstack - layered configuration store
//!
//! This crate implements a small layered configuration reader: a nested
//! document (scalars, sequences, mappings) with dotted-path lookup, typed
//! defaulted getters, and a deep merge that lets higher-priority layers
//! override lower ones key by key.
//!
//! The store never fails a read: missing paths, wrong shapes, and
//! unparseable values all degrade to the caller-supplied default. Only the
//! file loaders return errors.

pub mod loader;
pub mod merge;
pub mod store;

pub use loader::{ConfigError, ConfigSource};
pub use merge::{deep_merge, merge_layers};
pub use store::ConfigStore;
