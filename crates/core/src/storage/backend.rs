//! The [`Storage`] trait every media backend implements.
//!
//! Backends address files by logical, `/`-separated relative paths such as
//! `destinations/4/0f9e.jpg`. Path validation is shared (see
//! [`validate_path`]) so every backend rejects the same inputs.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path '{0}'")]
    InvalidPath(String),

    #[error("Unknown storage backend '{0}'")]
    UnknownBackend(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Other(String),
}

impl StorageError {
    /// Wrap an I/O error, mapping `NotFound` onto [`StorageError::NotFound`].
    pub fn from_io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_string())
        } else {
            Self::Io {
                path: path.to_string(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

impl std::fmt::Debug for dyn Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("name", &self.name()).finish()
    }
}

/// Async file store addressed by logical path.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Registry name of this backend (e.g. `default`).
    fn name(&self) -> &str;

    /// Whether a file exists at `path`. Directories do not count.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Read the whole file.
    async fn open(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Create or replace the file at `path`.
    async fn save(&self, path: &str, data: &[u8]) -> StorageResult<()>;

    /// Remove the file at `path`. Returns `false` if it was already absent.
    async fn delete(&self, path: &str) -> StorageResult<bool>;

    /// File size in bytes.
    async fn size(&self, path: &str) -> StorageResult<u64>;

    /// Every non-hidden file, as sorted logical paths.
    ///
    /// Entries whose name starts with `.` are skipped, and hidden directories
    /// are not descended into.
    async fn list(&self) -> StorageResult<Vec<String>>;

    /// Remove empty directories bottom-up and return the removed paths.
    ///
    /// Backends without real directories have nothing to prune.
    async fn prune_empty_dirs(&self) -> StorageResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Reject anything that is not a clean relative logical path.
pub fn validate_path(path: &str) -> StorageResult<()> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if invalid {
        Err(StorageError::InvalidPath(path.to_string()))
    } else {
        Ok(())
    }
}

/// Whether any segment of `path` is hidden (starts with `.`).
pub fn is_hidden_path(path: &str) -> bool {
    path.split('/').any(|seg| seg.starts_with('.'))
}
