//! Copy every referenced file from one named backend to another.
//!
//! Each copy is verified by reading it back. Nothing is deleted from the
//! source, and rows keep their logical paths.

use serde::Serialize;
use sqlx::SqlitePool;
use tdm_core::error::CoreError;
use tdm_core::storage::{Storage, StorageError, StorageRegistry};
use tdm_db::repositories::DestinationImageRepo;

use crate::error::MediaResult;
use crate::jobs::ItemError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub source: String,
    pub destination: String,
    pub dry_run: bool,
    /// Image rows with at least one migrated file.
    pub migrated: usize,
    pub files_copied: usize,
    /// Files absent at the source or already present at the destination.
    pub skipped: usize,
    pub errors: usize,
    pub failures: Vec<ItemError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Copied,
    MissingAtSource,
    AlreadyPresent,
}

/// Migrate all image files from `source` to `destination`.
///
/// Unknown backend names and `source == destination` are setup errors.
pub async fn migrate_storage(
    pool: &SqlitePool,
    registry: &StorageRegistry,
    source: &str,
    destination: &str,
    dry_run: bool,
) -> MediaResult<MigrationReport> {
    if source == destination {
        return Err(CoreError::Validation(format!(
            "Source and destination backends are both '{source}'"
        ))
        .into());
    }
    let src = registry.get(source)?;
    let dst = registry.get(destination)?;

    let mut report = MigrationReport {
        source: source.to_string(),
        destination: destination.to_string(),
        dry_run,
        ..Default::default()
    };

    for image in DestinationImageRepo::list_all(pool).await? {
        let mut changed = false;

        for path in image.referenced_paths() {
            match migrate_file(src.as_ref(), dst.as_ref(), path, dry_run).await {
                Ok(FileOutcome::Copied) => {
                    tracing::info!(image_id = image.id, path, dry_run, "Migrated file");
                    report.files_copied += 1;
                    changed = true;
                }
                Ok(FileOutcome::MissingAtSource) => {
                    tracing::warn!(image_id = image.id, path, "Skipping file missing at source");
                    report.skipped += 1;
                }
                Ok(FileOutcome::AlreadyPresent) => {
                    tracing::debug!(image_id = image.id, path, "Skipping file already at destination");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(image_id = image.id, path, error = %e, "File migration failed");
                    report.errors += 1;
                    report.failures.push(ItemError::new(image.id, path, e));
                }
            }
        }

        if changed {
            report.migrated += 1;
            if !dry_run {
                if let Err(e) = DestinationImageRepo::touch(pool, image.id).await {
                    tracing::error!(image_id = image.id, error = %e, "Failed to touch migrated image");
                    report.errors += 1;
                    report
                        .failures
                        .push(ItemError::new(image.id, image.image_path.clone(), e));
                }
            }
        }
    }

    tracing::info!(
        migrated = report.migrated,
        skipped = report.skipped,
        errors = report.errors,
        dry_run,
        "Storage migration complete"
    );
    Ok(report)
}

async fn migrate_file(
    src: &dyn Storage,
    dst: &dyn Storage,
    path: &str,
    dry_run: bool,
) -> Result<FileOutcome, StorageError> {
    if !src.exists(path).await? {
        return Ok(FileOutcome::MissingAtSource);
    }
    if dst.exists(path).await? {
        return Ok(FileOutcome::AlreadyPresent);
    }
    if dry_run {
        return Ok(FileOutcome::Copied);
    }

    let data = src.open(path).await?;
    if let Err(e) = dst.save(path, &data).await {
        remove_partial(dst, path).await;
        return Err(e);
    }

    let verified = match dst.open(path).await {
        Ok(copy) => copy == data,
        Err(_) => false,
    };
    if !verified {
        remove_partial(dst, path).await;
        return Err(StorageError::Other(format!(
            "verification failed for '{path}' on '{}'",
            dst.name()
        )));
    }
    Ok(FileOutcome::Copied)
}

async fn remove_partial(dst: &dyn Storage, path: &str) {
    if let Err(e) = dst.delete(path).await {
        tracing::warn!(path, backend = dst.name(), error = %e, "Failed to remove partial copy");
    }
}
