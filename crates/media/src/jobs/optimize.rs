//! Re-encode oversized primary images in place.
//!
//! Skips images already flagged optimized, encodings other than JPEG/PNG,
//! and re-encodes that save less than ~10%. Dry runs decide without writing.

use serde::Serialize;
use sqlx::SqlitePool;
use tdm_core::imaging::{
    clamp_quality, is_worthwhile_reduction, ImagingError, DEFAULT_JPEG_QUALITY,
    DEFAULT_MAX_WIDTH, MIN_MAX_WIDTH,
};
use tdm_core::storage::Storage;
use tdm_core::types::DbId;
use tdm_core::units::reduction_percent;
use tdm_db::models::image::DestinationImage;
use tdm_db::repositories::DestinationImageRepo;

use crate::error::{MediaError, MediaResult};
use crate::offload;

#[derive(Debug, Clone, Copy)]
pub struct OptimizeOptions {
    pub quality: u8,
    pub max_width: u32,
    pub dry_run: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            max_width: DEFAULT_MAX_WIDTH,
            dry_run: false,
        }
    }
}

impl OptimizeOptions {
    /// Clamp quality into `1..=100` and `max_width` to at least 100.
    pub fn normalized(self) -> Self {
        Self {
            quality: clamp_quality(self.quality),
            max_width: self.max_width.max(MIN_MAX_WIDTH),
            dry_run: self.dry_run,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeDecision {
    Optimized,
    WouldOptimize,
    AlreadyOptimized,
    NoPrimary,
    UnsupportedFormat,
    InsufficientReduction,
    Failed,
}

impl OptimizeDecision {
    pub fn label(self) -> &'static str {
        match self {
            Self::Optimized => "optimized",
            Self::WouldOptimize => "would optimize",
            Self::AlreadyOptimized => "already optimized",
            Self::NoPrimary => "no primary image",
            Self::UnsupportedFormat => "unsupported format",
            Self::InsufficientReduction => "insufficient size reduction",
            Self::Failed => "failed",
        }
    }
}

/// Per-image line of the optimization report.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeItem {
    pub image_id: DbId,
    pub path: String,
    pub decision: OptimizeDecision,
    pub size_before: Option<u64>,
    pub size_after: Option<u64>,
    pub reduction_percent: Option<f64>,
    pub detail: Option<String>,
}

impl OptimizeItem {
    fn new(image: &DestinationImage, decision: OptimizeDecision) -> Self {
        Self {
            image_id: image.id,
            path: image.image_path.clone(),
            decision,
            size_before: None,
            size_after: None,
            reduction_percent: None,
            detail: None,
        }
    }

    fn with_sizes(mut self, before: u64, after: u64) -> Self {
        self.size_before = Some(before);
        self.size_after = Some(after);
        self.reduction_percent = Some(reduction_percent(before, after));
        self
    }

    fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizeReport {
    pub dry_run: bool,
    /// Images optimized, or that would be in a dry run.
    pub optimized: usize,
    pub skipped: usize,
    pub errors: usize,
    pub bytes_saved: u64,
    pub items: Vec<OptimizeItem>,
}

impl OptimizeReport {
    fn push(&mut self, item: OptimizeItem) {
        match item.decision {
            OptimizeDecision::Optimized | OptimizeDecision::WouldOptimize => {
                self.optimized += 1;
                if let (Some(before), Some(after)) = (item.size_before, item.size_after) {
                    self.bytes_saved += before.saturating_sub(after);
                }
            }
            OptimizeDecision::Failed => self.errors += 1,
            _ => self.skipped += 1,
        }
        self.items.push(item);
    }
}

/// Optimize every image in the database.
pub async fn optimize_images(
    pool: &SqlitePool,
    storage: &dyn Storage,
    options: OptimizeOptions,
) -> MediaResult<OptimizeReport> {
    let options = options.normalized();
    let mut report = OptimizeReport {
        dry_run: options.dry_run,
        ..Default::default()
    };

    for image in DestinationImageRepo::list_all(pool).await? {
        let item = optimize_one(pool, storage, &image, &options).await;
        if item.decision == OptimizeDecision::Failed {
            tracing::error!(
                image_id = image.id,
                path = %image.image_path,
                error = item.detail.as_deref().unwrap_or_default(),
                "Optimization failed"
            );
        } else {
            tracing::debug!(image_id = image.id, decision = item.decision.label(), "Optimization decision");
        }
        report.push(item);
    }

    tracing::info!(
        optimized = report.optimized,
        skipped = report.skipped,
        errors = report.errors,
        dry_run = report.dry_run,
        "Optimization complete"
    );
    Ok(report)
}

async fn optimize_one(
    pool: &SqlitePool,
    storage: &dyn Storage,
    image: &DestinationImage,
    options: &OptimizeOptions,
) -> OptimizeItem {
    if image.image_path.is_empty() {
        return OptimizeItem::new(image, OptimizeDecision::NoPrimary);
    }
    if image.is_optimized {
        return OptimizeItem::new(image, OptimizeDecision::AlreadyOptimized);
    }

    let failed = |e: &dyn std::fmt::Display| {
        OptimizeItem::new(image, OptimizeDecision::Failed).with_detail(e)
    };

    let original = match storage.open(&image.image_path).await {
        Ok(data) => data,
        Err(e) => return failed(&e),
    };
    let before = original.len() as u64;

    let reencoded = match offload::reencode(original, options.quality, options.max_width).await {
        Ok(out) => out,
        Err(MediaError::Imaging(ImagingError::Unsupported(format))) => {
            return OptimizeItem::new(image, OptimizeDecision::UnsupportedFormat)
                .with_detail(format);
        }
        Err(e) => return failed(&e),
    };
    let after = reencoded.data.len() as u64;

    if !is_worthwhile_reduction(before, after) {
        return OptimizeItem::new(image, OptimizeDecision::InsufficientReduction)
            .with_sizes(before, after);
    }
    if options.dry_run {
        return OptimizeItem::new(image, OptimizeDecision::WouldOptimize).with_sizes(before, after);
    }

    if let Err(e) = storage.save(&image.image_path, &reencoded.data).await {
        return failed(&e);
    }
    if let Err(e) = DestinationImageRepo::mark_optimized(pool, image.id).await {
        return failed(&e).with_sizes(before, after);
    }

    tracing::info!(
        image_id = image.id,
        before,
        after,
        resized = reencoded.resized,
        "Optimized image"
    );
    OptimizeItem::new(image, OptimizeDecision::Optimized).with_sizes(before, after)
}
