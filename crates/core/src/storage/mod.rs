//! Pluggable media storage.
//!
//! Jobs and the request path receive an `Arc<dyn Storage>` (or a
//! [`StorageRegistry`] when they need more than one backend); nothing reaches
//! for a global store.

mod backend;
pub mod config;
mod local;
mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use backend::{is_hidden_path, validate_path, Storage, StorageError, StorageResult};
pub use config::{BackendConfig, MediaSettings, DEFAULT_BACKEND};
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Named storage backends available to a process.
#[derive(Clone, Default)]
pub struct StorageRegistry {
    backends: BTreeMap<String, Arc<dyn Storage>>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own [`Storage::name`], replacing any
    /// previous backend of that name.
    pub fn insert(&mut self, backend: Arc<dyn Storage>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> StorageResult<Arc<dyn Storage>> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::UnknownBackend(name.to_string()))
    }

    /// The backend rooted at the media directory.
    pub fn default_backend(&self) -> StorageResult<Arc<dyn Storage>> {
        self.get(DEFAULT_BACKEND)
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn unknown_backend_is_an_error() {
        let registry = StorageRegistry::new();
        assert_matches!(registry.get("nope"), Err(StorageError::UnknownBackend(_)));
        assert_matches!(registry.default_backend(), Err(StorageError::UnknownBackend(_)));
    }

    #[test]
    fn insert_uses_backend_name() {
        let mut registry = StorageRegistry::new();
        registry.insert(Arc::new(MemoryStorage::new("default")));
        registry.insert(Arc::new(MemoryStorage::new("archive")));
        assert_eq!(registry.names(), vec!["archive", "default"]);
        assert!(registry.default_backend().is_ok());
    }
}
