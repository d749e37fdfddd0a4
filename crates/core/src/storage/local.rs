//! Local filesystem backend rooted at a media directory.
//!
//! ```text
//! {root}/
//!   destinations/{destination_id}/{uuid}.{ext}
//!   thumbnails/destinations/{destination_id}/thumb_{uuid}.{ext}.jpg
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::backend::{validate_path, Storage, StorageError, StorageResult};

pub struct LocalStorage {
    name: String,
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }

    /// Walk the tree, returning `(files, directories)` as logical paths.
    ///
    /// Hidden entries are skipped entirely. A missing root yields nothing.
    async fn walk(&self) -> StorageResult<(Vec<String>, Vec<String>)> {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        let mut stack: Vec<(PathBuf, String)> = vec![(self.root.clone(), String::new())];

        while let Some((dir, prefix)) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::from_io(&prefix, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::from_io(&prefix, e))?
            {
                let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                    tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                    continue;
                };
                if name.starts_with('.') {
                    continue;
                }
                let logical = if prefix.is_empty() {
                    name
                } else {
                    format!("{prefix}/{name}")
                };
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::from_io(&logical, e))?;
                if file_type.is_dir() {
                    dirs.push(logical.clone());
                    stack.push((entry.path(), logical));
                } else if file_type.is_file() {
                    files.push(logical);
                }
            }
        }

        files.sort();
        Ok((files, dirs))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let full = self.resolve(path)?;
        match fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_io(path, e)),
        }
    }

    async fn open(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full)
            .await
            .map_err(|e| StorageError::from_io(path, e))
    }

    /// Writes to a hidden sibling temp file, then renames over the target so
    /// readers never observe a half-written file.
    async fn save(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(path, e))?;
        }

        let file_name = full
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;
        let tmp = full.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::from_io(path, e));
        }
        if let Err(e) = fs::rename(&tmp, &full).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::from_io(path, e));
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<bool> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_io(path, e)),
        }
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        let full = self.resolve(path)?;
        let meta = fs::metadata(&full)
            .await
            .map_err(|e| StorageError::from_io(path, e))?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        Ok(meta.len())
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        let (files, _) = self.walk().await?;
        Ok(files)
    }

    async fn prune_empty_dirs(&self) -> StorageResult<Vec<String>> {
        let (_, mut dirs) = self.walk().await?;
        // Deepest first, so a parent emptied by its children goes too.
        dirs.sort_by_key(|d| std::cmp::Reverse(d.matches('/').count()));

        let mut removed = Vec::new();
        for dir in dirs {
            let full = self.root.join(&dir);
            let mut entries = match fs::read_dir(&full).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::from_io(&dir, e)),
            };
            let is_empty = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::from_io(&dir, e))?
                .is_none();
            if !is_empty {
                continue;
            }
            match fs::remove_dir(&full).await {
                Ok(()) => {
                    tracing::debug!(dir = %dir, "Removed empty directory");
                    removed.push(dir);
                }
                Err(e) => {
                    tracing::warn!(dir = %dir, error = %e, "Failed to remove empty directory");
                }
            }
        }
        Ok(removed)
    }
}
