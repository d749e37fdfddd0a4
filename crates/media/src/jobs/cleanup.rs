//! Orphaned file cleanup and empty-directory pruning.
//!
//! The database is the source of truth: any non-hidden file in storage that
//! no image row references (as primary or thumbnail) is deleted.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::SqlitePool;
use tdm_core::storage::Storage;
use tdm_db::repositories::DestinationImageRepo;

use crate::error::MediaResult;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub files_scanned: usize,
    pub files_deleted: usize,
    pub bytes_reclaimed: u64,
    /// Unreferenced files found (deleted unless this was a dry run).
    pub unused_files: Vec<String>,
    pub dirs_removed: Vec<String>,
    pub errors: Vec<String>,
}

/// Delete every unreferenced file, then prune empty directories.
pub async fn cleanup_unused_files(
    pool: &SqlitePool,
    storage: &dyn Storage,
    dry_run: bool,
) -> MediaResult<CleanupReport> {
    let referenced: HashSet<String> = DestinationImageRepo::referenced_paths(pool)
        .await?
        .into_iter()
        .collect();
    let present = storage.list().await?;

    let mut report = CleanupReport {
        dry_run,
        files_scanned: present.len(),
        ..Default::default()
    };

    for path in present {
        if referenced.contains(&path) {
            continue;
        }
        if dry_run {
            tracing::info!(path = %path, "Would delete unused file");
            report.unused_files.push(path);
            continue;
        }

        let size = storage.size(&path).await.unwrap_or(0);
        match storage.delete(&path).await {
            Ok(_) => {
                tracing::info!(path = %path, "Deleted unused file");
                report.files_deleted += 1;
                report.bytes_reclaimed += size;
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to delete unused file");
                report.errors.push(format!("{path}: {e}"));
            }
        }
        report.unused_files.push(path);
    }

    if !dry_run {
        report.dirs_removed = prune_empty_dirs(storage).await?;
    }

    tracing::info!(
        scanned = report.files_scanned,
        deleted = report.files_deleted,
        errors = report.errors.len(),
        "Media cleanup complete"
    );
    Ok(report)
}

/// Remove empty directories bottom-up. Hidden directories are left alone.
pub async fn prune_empty_dirs(storage: &dyn Storage) -> MediaResult<Vec<String>> {
    let removed = storage.prune_empty_dirs().await?;
    tracing::info!(removed = removed.len(), "Empty directory pruning complete");
    Ok(removed)
}
