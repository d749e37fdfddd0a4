//! In-memory backend, used by tests and the `memory` backend type.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::{is_hidden_path, validate_path, Storage, StorageError, StorageResult};

#[derive(Default)]
pub struct MemoryStorage {
    name: String,
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    mutations: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Number of successful `save` and `delete` calls so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Total number of stored files, hidden ones included.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        Ok(self.files.read().await.contains_key(path))
    }

    async fn open(&self, path: &str) -> StorageResult<Vec<u8>> {
        validate_path(path)?;
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn save(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        validate_path(path)?;
        self.files.write().await.insert(path.to_string(), data.to_vec());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        validate_path(path)?;
        let removed = self.files.write().await.remove(path).is_some();
        if removed {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        validate_path(path)?;
        self.files
            .read()
            .await
            .get(path)
            .map(|data| data.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .files
            .read()
            .await
            .keys()
            .filter(|p| !is_hidden_path(p))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_and_mutation_count() {
        let storage = MemoryStorage::new("mem");
        storage.save("a/b.jpg", b"xyz").await.unwrap();
        assert_eq!(storage.open("a/b.jpg").await.unwrap(), b"xyz");
        assert_eq!(storage.size("a/b.jpg").await.unwrap(), 3);
        assert!(storage.delete("a/b.jpg").await.unwrap());
        assert!(!storage.delete("a/b.jpg").await.unwrap());
        assert_eq!(storage.mutation_count(), 2);
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn list_hides_dot_entries() {
        let storage = MemoryStorage::new("mem");
        storage.save("b.jpg", b"").await.unwrap();
        storage.save("a/.keep", b"").await.unwrap();
        storage.save(".cache/c.jpg", b"").await.unwrap();
        assert_eq!(storage.list().await.unwrap(), vec!["b.jpg".to_string()]);
        assert_eq!(storage.len().await, 3);
    }

    #[tokio::test]
    async fn prune_is_a_noop() {
        let storage = MemoryStorage::new("mem");
        assert!(storage.prune_empty_dirs().await.unwrap().is_empty());
    }
}
