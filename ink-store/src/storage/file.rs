//! File-backed content store.
//!
//! Layout on disk:
//! ```text
//! <path>/
//!   ink_app_storage_stories.json     ← namespace "stories"
//!   ink_app_storage_<namespace>.json
//! ```
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! crash mid-write leaves the previous value intact.

use log::debug;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{validate_namespace, ContentStore, StoreError};

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Data directory
    pub path: PathBuf,
    /// Prefix of every file name (default: `ink_app_storage`)
    pub key_prefix: String,
    /// Pretty-print JSON on write (default: false)
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ink_data"),
            key_prefix: "ink_app_storage".to_string(),
            pretty: false,
        }
    }
}

impl StoreConfig {
    /// Config for testing: given directory, readable output.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: true,
            ..Self::default()
        }
    }
}

pub struct FileStore {
    config: StoreConfig,
}

impl FileStore {
    /// Open the store, creating the data directory if needed.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.path).map_err(|source| StoreError::Io {
            path: config.path.clone(),
            source,
        })?;
        debug!("file store opened at {}", config.path.display());
        Ok(Self { config })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// File holding `namespace`.
    pub fn file_for(&self, namespace: &str) -> PathBuf {
        self.config
            .path
            .join(format!("{}_{namespace}.json", self.config.key_prefix))
    }
}

impl ContentStore for FileStore {
    fn get(&self, namespace: &str) -> Result<Option<Value>, StoreError> {
        validate_namespace(namespace)?;
        let path = self.file_for(namespace);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Deserialization {
                namespace: namespace.to_string(),
                source,
            })?;
        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }

    fn set(&mut self, namespace: &str, value: Value) -> Result<(), StoreError> {
        validate_namespace(namespace)?;
        let encoded = if self.config.pretty {
            serde_json::to_vec_pretty(&value)
        } else {
            serde_json::to_vec(&value)
        }
        .map_err(|source| StoreError::Serialization {
            namespace: namespace.to_string(),
            source,
        })?;

        let path = self.file_for(namespace);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &encoded).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("wrote {} bytes to {}", encoded.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, namespace: &str) -> Result<(), StoreError> {
        validate_namespace(namespace)?;
        let path = self.file_for(namespace);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}
