//! Key/value content storage.
//!
//! A store maps a namespace to one JSON value. Backends:
//!
//! - [`FileStore`]: one JSON file per namespace in a data directory
//! - [`MemoryStore`]: in-process map, with switchable failure for tests

pub mod file;
pub mod memory;

pub use file::{FileStore, StoreConfig};
pub use memory::MemoryStore;

use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {namespace}: {source}")]
    Serialization {
        namespace: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize {namespace}: {source}")]
    Deserialization {
        namespace: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Generic JSON key/value persistence.
///
/// `get` returns `None` both for a missing namespace and for a stored
/// `null`.
pub trait ContentStore {
    fn get(&self, namespace: &str) -> Result<Option<Value>, StoreError>;

    fn set(&mut self, namespace: &str, value: Value) -> Result<(), StoreError>;

    fn remove(&mut self, namespace: &str) -> Result<(), StoreError>;
}

/// Namespaces become file names, so keep them to a safe alphabet.
pub(crate) fn validate_namespace(namespace: &str) -> Result<(), StoreError> {
    let valid = !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidNamespace(namespace.to_string()))
    }
}
