//! Batch thumbnail generation.

use serde::Serialize;
use sqlx::SqlitePool;
use tdm_core::imaging::ThumbnailPolicy;
use tdm_core::storage::Storage;
use tdm_db::repositories::DestinationImageRepo;

use crate::error::MediaResult;
use crate::jobs::ItemError;
use crate::lifecycle::{ensure_thumbnail, ThumbnailOutcome};

#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbnailJobOptions {
    pub policy: ThumbnailPolicy,
    /// Regenerate thumbnails that already exist.
    pub force: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ThumbnailReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<ItemError>,
}

/// Ensure every image has a thumbnail.
pub async fn generate_thumbnails(
    pool: &SqlitePool,
    storage: &dyn Storage,
    options: &ThumbnailJobOptions,
) -> MediaResult<ThumbnailReport> {
    let mut report = ThumbnailReport::default();

    for image in DestinationImageRepo::list_all(pool).await? {
        match ensure_thumbnail(pool, storage, &image, &options.policy, options.force).await {
            Ok(ThumbnailOutcome::Created(path)) => {
                tracing::info!(image_id = image.id, path = %path, "Created thumbnail");
                report.created += 1;
            }
            Ok(ThumbnailOutcome::Existing(_)) => report.skipped += 1,
            Ok(ThumbnailOutcome::NoPrimary) => {
                tracing::warn!(image_id = image.id, "Skipping image without a primary file");
                report.skipped += 1;
            }
            Err(e) => {
                tracing::error!(
                    image_id = image.id,
                    destination_id = image.destination_id,
                    error = %e,
                    "Thumbnail generation failed"
                );
                report.failed += 1;
                report
                    .errors
                    .push(ItemError::new(image.id, image.image_path.clone(), e));
            }
        }
    }

    tracing::info!(
        created = report.created,
        skipped = report.skipped,
        failed = report.failed,
        "Thumbnail generation complete"
    );
    Ok(report)
}
