//! Per-request image lifecycle: store a primary asset, derive its thumbnail,
//! and delete rows before their files.
//!
//! Ordering rules:
//! - A primary file is written before its row; if the row insert fails the
//!   file is removed again.
//! - A thumbnail row reference is only set after the file exists, and a row
//!   is never left pointing at a missing thumbnail.
//! - Deletes remove rows first (in a transaction for destinations), then
//!   files best-effort. Files that cannot be removed are queued in
//!   `pending_file_cleanups`.

use serde::Serialize;
use sqlx::SqlitePool;
use tdm_core::destination::validate_caption;
use tdm_core::error::CoreError;
use tdm_core::imaging::ThumbnailPolicy;
use tdm_core::naming;
use tdm_core::storage::{Storage, StorageRegistry};
use tdm_core::types::DbId;
use tdm_db::models::image::{CreateDestinationImage, DestinationImage};
use tdm_db::repositories::{DestinationImageRepo, DestinationRepo, PendingCleanupRepo};

use crate::error::{MediaError, MediaResult};
use crate::offload;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Persist an uploaded image as a new primary asset of `destination_id`.
///
/// The bytes must decode as a supported image. Does not derive the thumbnail; see
/// [`add_image`] for the full write path.
pub async fn store_primary(
    pool: &SqlitePool,
    storage: &dyn Storage,
    destination_id: DbId,
    original_filename: &str,
    data: &[u8],
    caption: &str,
) -> MediaResult<DestinationImage> {
    validate_caption(caption)?;
    match offload::inspect_upload(data.to_vec()).await {
        Ok(info) => {
            tracing::debug!(
                format = ?info.format,
                width = info.width,
                height = info.height,
                "Upload decoded"
            );
        }
        Err(MediaError::Imaging(e)) => {
            return Err(CoreError::Validation(format!(
                "'{original_filename}' is not a valid image: {e}"
            ))
            .into());
        }
        Err(e) => return Err(e),
    }

    let path = naming::primary_image_path(destination_id, original_filename);
    storage.save(&path, data).await?;

    let input = CreateDestinationImage {
        destination_id,
        image_path: path.clone(),
        caption: caption.to_string(),
    };
    match DestinationImageRepo::create(pool, &input).await {
        Ok(image) => {
            tracing::info!(image_id = image.id, destination_id, path = %path, "Stored primary image");
            Ok(image)
        }
        Err(e) => {
            if let Err(cleanup) = storage.delete(&path).await {
                tracing::warn!(path = %path, error = %cleanup, "Failed to remove orphaned upload");
            }
            Err(e.into())
        }
    }
}

/// Store a primary image, then ensure its thumbnail.
///
/// A failed thumbnail does not fail the upload: it is logged and the image
/// is returned without one.
pub async fn add_image(
    pool: &SqlitePool,
    storage: &dyn Storage,
    policy: &ThumbnailPolicy,
    destination_id: DbId,
    original_filename: &str,
    data: &[u8],
    caption: &str,
) -> MediaResult<DestinationImage> {
    let image =
        store_primary(pool, storage, destination_id, original_filename, data, caption).await?;

    if let Err(e) = ensure_thumbnail(pool, storage, &image, policy, false).await {
        tracing::error!(image_id = image.id, error = %e, "Thumbnail derivation failed");
    }

    DestinationImageRepo::find_by_id(pool, image.id)
        .await?
        .ok_or(MediaError::Core(CoreError::NotFound {
            entity: "DestinationImage",
            id: image.id,
        }))
}

// ---------------------------------------------------------------------------
// Thumbnails
// ---------------------------------------------------------------------------

/// What [`ensure_thumbnail`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// A thumbnail was written and the row now points at it.
    Created(String),
    /// The row already references an existing thumbnail.
    Existing(String),
    /// The row has no primary image to derive from.
    NoPrimary,
}

/// Idempotently make sure `image` has a thumbnail that exists in storage.
///
/// A reference to a missing thumbnail is cleared before regenerating. With
/// `force`, an existing thumbnail is regenerated in place.
pub async fn ensure_thumbnail(
    pool: &SqlitePool,
    storage: &dyn Storage,
    image: &DestinationImage,
    policy: &ThumbnailPolicy,
    force: bool,
) -> MediaResult<ThumbnailOutcome> {
    if image.image_path.is_empty() {
        return Ok(ThumbnailOutcome::NoPrimary);
    }

    let mut current = image.thumbnail_path.clone().filter(|p| !p.is_empty());
    if let Some(path) = &current {
        if storage.exists(path).await? {
            if !force {
                return Ok(ThumbnailOutcome::Existing(path.clone()));
            }
        } else {
            tracing::warn!(image_id = image.id, path = %path, "Clearing dangling thumbnail reference");
            DestinationImageRepo::set_thumbnail(pool, image.id, None).await?;
            current = None;
        }
    }

    let target = naming::thumbnail_path(&image.image_path);
    let primary = storage.open(&image.image_path).await?;
    let thumb = offload::render_thumbnail(primary, *policy).await?;
    storage.save(&target, &thumb).await?;

    if current.as_deref() != Some(target.as_str()) {
        if let Err(e) = DestinationImageRepo::set_thumbnail(pool, image.id, Some(&target)).await {
            if let Err(cleanup) = storage.delete(&target).await {
                tracing::warn!(path = %target, error = %cleanup, "Failed to remove unreferenced thumbnail");
            }
            return Err(e.into());
        }
        // A thumbnail under an older name is now unreferenced.
        if let Some(old) = current {
            if let Err(e) = storage.delete(&old).await {
                tracing::warn!(path = %old, error = %e, "Failed to remove superseded thumbnail");
            }
        }
    }

    tracing::debug!(image_id = image.id, path = %target, "Thumbnail written");
    Ok(ThumbnailOutcome::Created(target))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Outcome of removing the files of deleted rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileCleanupSummary {
    pub files_deleted: usize,
    /// Files that were already absent.
    pub files_missing: usize,
    /// Files queued for a later `purge-pending` pass.
    pub files_pending: usize,
}

impl FileCleanupSummary {
    fn merge(&mut self, other: FileCleanupSummary) {
        self.files_deleted += other.files_deleted;
        self.files_missing += other.files_missing;
        self.files_pending += other.files_pending;
    }
}

/// Delete one image row and then its files.
///
/// Returns `None` if no such image exists under `destination_id`.
pub async fn delete_image(
    pool: &SqlitePool,
    storage: &dyn Storage,
    destination_id: DbId,
    image_id: DbId,
) -> MediaResult<Option<FileCleanupSummary>> {
    if DestinationImageRepo::find_for_destination(pool, destination_id, image_id)
        .await?
        .is_none()
    {
        return Ok(None);
    }
    let Some(image) = DestinationImageRepo::delete_returning(pool, image_id).await? else {
        return Ok(None);
    };
    tracing::info!(image_id, destination_id, "Deleted destination image");
    Ok(Some(remove_image_files(pool, storage, &image).await))
}

/// Delete a destination with all its images, then their files.
///
/// Returns `None` if the destination does not exist.
pub async fn delete_destination(
    pool: &SqlitePool,
    storage: &dyn Storage,
    destination_id: DbId,
) -> MediaResult<Option<FileCleanupSummary>> {
    let Some(images) = DestinationRepo::delete_with_images(pool, destination_id).await? else {
        return Ok(None);
    };
    tracing::info!(destination_id, images = images.len(), "Deleted destination");

    let mut summary = FileCleanupSummary::default();
    for image in &images {
        summary.merge(remove_image_files(pool, storage, image).await);
    }
    Ok(Some(summary))
}

/// Best-effort removal of every file a (deleted) row referenced.
async fn remove_image_files(
    pool: &SqlitePool,
    storage: &dyn Storage,
    image: &DestinationImage,
) -> FileCleanupSummary {
    let mut summary = FileCleanupSummary::default();
    for path in image.referenced_paths() {
        match storage.delete(path).await {
            Ok(true) => summary.files_deleted += 1,
            Ok(false) => summary.files_missing += 1,
            Err(e) => {
                summary.files_pending += 1;
                tracing::warn!(image_id = image.id, path, error = %e, "File delete failed, queueing retry");
                if let Err(db_err) =
                    PendingCleanupRepo::record(pool, storage.name(), path, &e.to_string()).await
                {
                    tracing::error!(path, error = %db_err, "Failed to record pending file cleanup");
                }
            }
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Pending cleanups
// ---------------------------------------------------------------------------

/// Result of retrying queued file deletions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurgeReport {
    pub resolved: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Retry every pending file deletion.
///
/// Deleted or already-absent files resolve their entry; failures bump the
/// attempt count.
pub async fn purge_pending(pool: &SqlitePool, registry: &StorageRegistry) -> MediaResult<PurgeReport> {
    let mut report = PurgeReport::default();

    for entry in PendingCleanupRepo::list(pool).await? {
        let result = match registry.get(&entry.backend) {
            Ok(storage) => storage.delete(&entry.path).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(_) => {
                PendingCleanupRepo::resolve(pool, entry.id).await?;
                report.resolved += 1;
            }
            Err(e) => {
                let message = format!("{}:{}: {e}", entry.backend, entry.path);
                tracing::warn!(entry_id = entry.id, error = %message, "Pending cleanup still failing");
                PendingCleanupRepo::record_failure(pool, entry.id, &e.to_string()).await?;
                report.failed += 1;
                report.errors.push(message);
            }
        }
    }

    tracing::info!(resolved = report.resolved, failed = report.failed, "Pending cleanup pass complete");
    Ok(report)
}
