//! JSON export of destinations with nested images.
//!
//! The record layout (`model` / `pk` / `fields`) is also what `import` reads,
//! so an export can be replayed into another installation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tdm_core::storage::MediaSettings;
use tdm_core::types::{DbId, Timestamp};
use tdm_db::models::destination::Destination;
use tdm_db::models::image::DestinationImage;
use tdm_db::repositories::{DestinationImageRepo, DestinationRepo};
use tdm_db::DbPool;

use crate::context::ManageContext;

/// Model tag of destination records.
pub const DESTINATION_MODEL: &str = "destinations.destination";

/// One exported destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub model: String,
    pub pk: DbId,
    pub fields: DestinationFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationFields {
    pub place_name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub google_map_link: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub images: Vec<ExportImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportImage {
    /// Absolute URL of the primary image.
    pub image: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl ExportRecord {
    pub fn new(destination: Destination, images: &[DestinationImage], media: &MediaSettings) -> Self {
        let images = images
            .iter()
            .map(|image| ExportImage {
                image: Some(image.image_path.as_str())
                    .filter(|p| !p.is_empty())
                    .map(|p| media.url_for(p)),
                thumbnail: image
                    .thumbnail_path
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .map(|p| media.url_for(p)),
                caption: image.caption.clone(),
                created_at: Some(image.created_at),
            })
            .collect();

        Self {
            model: DESTINATION_MODEL.to_string(),
            pk: destination.id,
            fields: DestinationFields {
                place_name: destination.name,
                slug: destination.slug,
                weather: destination.weather,
                state: destination.state,
                district: destination.district,
                google_map_link: destination.map_link,
                description: destination.description,
                created_at: Some(destination.created_at),
                updated_at: Some(destination.updated_at),
                images,
            },
        }
    }
}

/// `exports/destinations_export_{YYYYmmdd_HHMMSS}.json`.
pub fn default_output_path() -> PathBuf {
    PathBuf::from("exports").join(format!(
        "destinations_export_{}.json",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Every destination, ordered by id, with its images.
pub async fn build_export(pool: &DbPool, media: &MediaSettings) -> anyhow::Result<Vec<ExportRecord>> {
    let destinations = DestinationRepo::list_all(pool).await?;
    let mut images: HashMap<DbId, Vec<DestinationImage>> = HashMap::new();
    for image in DestinationImageRepo::list_all(pool).await? {
        images.entry(image.destination_id).or_default().push(image);
    }

    Ok(destinations
        .into_iter()
        .map(|destination| {
            let own = images.remove(&destination.id).unwrap_or_default();
            ExportRecord::new(destination, &own, media)
        })
        .collect())
}

/// Write the export to `output`, creating parent directories. Returns the record count.
pub async fn write_export(ctx: &ManageContext, output: &Path) -> anyhow::Result<usize> {
    let records = build_export(&ctx.pool, &ctx.media).await?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(&records)?;
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    tracing::info!(path = %output.display(), records = records.len(), "Exported destinations");
    Ok(records.len())
}
