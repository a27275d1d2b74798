//! Application state storage
//!
//! The state store holds small ephemeral values keyed by name, such as the
//! recently used connection list. Reads and writes are synchronous.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{StateError, StateResult};

/// Key/value state store
pub trait StateStore: Send + Sync {
    /// Returns the stored value, if any
    fn get_item(&self, key: &str) -> Option<Value>;

    /// Replaces the stored value
    ///
    /// # Errors
    /// Returns `StateError` if the value cannot be persisted.
    fn set_item(&self, key: &str, value: Value) -> StateResult<()>;
}

/// Reads a typed value, falling back to `default` when absent or malformed
pub fn get_typed<T: DeserializeOwned>(store: &dyn StateStore, key: &str, default: T) -> T {
    match store.get_item(key) {
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Ignoring malformed state value");
            default
        }),
        None => default,
    }
}

/// Serializes and stores a typed value
///
/// # Errors
/// Returns `StateError::Serialize` if the value cannot be serialized, or any
/// error from the underlying store.
pub fn set_typed<T: Serialize>(store: &dyn StateStore, key: &str, value: &T) -> StateResult<()> {
    let value = serde_json::to_value(value).map_err(|e| StateError::Serialize(e.to_string()))?;
    store.set_item(key, value)
}

/// Process-local state store
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    items: RwLock<HashMap<String, Value>>,
}

impl MemoryStateStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get_item(&self, key: &str) -> Option<Value> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: Value) -> StateResult<()> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// State store backed by a single JSON file
///
/// The whole file is loaded on open and rewritten on every `set_item`.
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
    items: RwLock<serde_json::Map<String, Value>>,
}

impl JsonStateStore {
    /// Opens (or prepares to create) the state file
    ///
    /// # Errors
    /// Returns `StateError` if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> StateResult<Self> {
        let path = path.into();
        let items = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| StateError::Io {
                path: path.clone(),
                source,
            })?;
            if content.trim().is_empty() {
                serde_json::Map::new()
            } else {
                serde_json::from_str(&content).map_err(|e| StateError::Serialize(e.to_string()))?
            }
        } else {
            serde_json::Map::new()
        };

        tracing::debug!(path = %path.display(), keys = items.len(), "State store opened");
        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, items: &serde_json::Map<String, Value>) -> StateResult<()> {
        let content = serde_json::to_string_pretty(items)
            .map_err(|e| StateError::Serialize(e.to_string()))?;
        write_atomic(&self.path, &content).map_err(|source| StateError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl StateStore for JsonStateStore {
    fn get_item(&self, key: &str) -> Option<Value> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: Value) -> StateResult<()> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value);
        self.write_file(&items)
    }
}

/// Writes a file through a sibling temp file and a rename
pub(crate) fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}
