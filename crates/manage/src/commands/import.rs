//! Import of destinations from an export file.
//!
//! Records are upserted by `pk`. Each image is fetched (HTTP(S) URL or local
//! path), stored as a new primary asset and given a thumbnail. Failures of a
//! single record or image are counted and the import continues.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Serialize;
use tdm_core::destination::{
    validate_explicit_slug, validate_map_link, validate_name, validate_short_field,
};
use tdm_core::slug::slugify;
use tdm_core::storage::Storage;
use tdm_db::models::destination::{CreateDestination, Destination};
use tdm_db::repositories::DestinationRepo;
use tdm_media::lifecycle;

use crate::commands::export::{ExportImage, ExportRecord, DESTINATION_MODEL};
use crate::context::ManageContext;

/// Counts reported after an import.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    /// Records of other models.
    pub skipped: usize,
    pub failed: usize,
    pub images_added: usize,
    pub images_failed: usize,
    pub errors: Vec<String>,
}

/// Where an exported image can be read from.
#[derive(Debug, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    Local(PathBuf),
}

impl ImageSource {
    /// Classify `reference`; relative local paths resolve against `base_dir`.
    pub fn parse(reference: &str, base_dir: &Path) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Self::Remote(reference.to_string());
        }
        let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
        if path.is_absolute() {
            Self::Local(path.to_path_buf())
        } else {
            Self::Local(base_dir.join(path))
        }
    }

    /// Last path segment, used to keep the original extension.
    pub fn file_name(&self) -> String {
        let raw = match self {
            Self::Remote(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next().unwrap_or_default().to_string()
            }
            Self::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if raw.is_empty() {
            "image.jpg".to_string()
        } else {
            raw
        }
    }

    async fn fetch(&self, client: &reqwest::Client) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Remote(url) => {
                let response = client.get(url).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            Self::Local(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read '{}'", path.display())),
        }
    }
}

/// Import every destination record of `file`.
///
/// A missing file, invalid JSON or a non-array document is a setup error.
pub async fn import_file(ctx: &ManageContext, file: &Path) -> anyhow::Result<ImportReport> {
    if !tokio::fs::try_exists(file).await.unwrap_or(false) {
        return Err(anyhow!("File not found: {}", file.display()));
    }
    let raw = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    let document: serde_json::Value = serde_json::from_slice(&raw).context("Invalid JSON file")?;
    let items = document
        .as_array()
        .ok_or_else(|| anyhow!("Invalid JSON file: expected an array of records"))?;

    let storage = ctx.storage()?;
    let client = reqwest::Client::new();
    let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let mut report = ImportReport::default();

    for item in items {
        if item.get("model").and_then(|m| m.as_str()) != Some(DESTINATION_MODEL) {
            report.skipped += 1;
            continue;
        }
        let pk = item.get("pk").cloned().unwrap_or_default();
        let record: ExportRecord = match serde_json::from_value(item.clone()) {
            Ok(record) => record,
            Err(e) => {
                report.failed += 1;
                report.errors.push(format!("destination {pk}: {e}"));
                continue;
            }
        };

        let destination = match upsert_destination(ctx, &record).await {
            Ok((destination, created)) => {
                if created {
                    report.created += 1;
                    tracing::info!(pk = record.pk, name = %destination.name, "Created destination");
                } else {
                    report.updated += 1;
                    tracing::info!(pk = record.pk, name = %destination.name, "Updated destination");
                }
                destination
            }
            Err(e) => {
                tracing::error!(pk = record.pk, error = %e, "Error processing destination");
                report.failed += 1;
                report.errors.push(format!("destination {}: {e:#}", record.pk));
                continue;
            }
        };

        for image in &record.fields.images {
            let Some(reference) = image.image.as_deref().filter(|r| !r.is_empty()) else {
                continue;
            };
            match import_image(ctx, storage.as_ref(), &client, &destination, image, reference, base_dir).await {
                Ok(()) => report.images_added += 1,
                Err(e) => {
                    tracing::warn!(
                        destination = %destination.name,
                        image = reference,
                        error = %e,
                        "Failed to import image"
                    );
                    report.images_failed += 1;
                    report.errors.push(format!("{} image {reference}: {e:#}", destination.name));
                }
            }
        }
    }

    Ok(report)
}

/// Insert or overwrite the destination with id `record.pk`. Returns whether it was new.
async fn upsert_destination(
    ctx: &ManageContext,
    record: &ExportRecord,
) -> anyhow::Result<(Destination, bool)> {
    let fields = &record.fields;
    validate_name(&fields.place_name)?;
    validate_short_field("weather", &fields.weather)?;
    validate_short_field("state", &fields.state)?;
    validate_short_field("district", &fields.district)?;

    let map_link = fields
        .google_map_link
        .clone()
        .filter(|link| !link.trim().is_empty());
    if let Some(link) = &map_link {
        validate_map_link(link)?;
    }

    let slug = if fields.slug.is_empty() {
        slugify(&fields.place_name)
    } else {
        validate_explicit_slug(&fields.slug)?;
        fields.slug.clone()
    };

    let existed = DestinationRepo::find_by_id(&ctx.pool, record.pk).await?.is_some();
    let input = CreateDestination {
        name: fields.place_name.clone(),
        slug: Some(slug.clone()),
        weather: fields.weather.clone(),
        state: fields.state.clone(),
        district: fields.district.clone(),
        map_link,
        description: fields.description.clone(),
    };
    let destination = DestinationRepo::upsert_with_id(&ctx.pool, record.pk, &input, &slug).await?;
    Ok((destination, !existed))
}

async fn import_image(
    ctx: &ManageContext,
    storage: &dyn Storage,
    client: &reqwest::Client,
    destination: &Destination,
    image: &ExportImage,
    reference: &str,
    base_dir: &Path,
) -> anyhow::Result<()> {
    let source = ImageSource::parse(reference, base_dir);
    let data = source.fetch(client).await?;
    let filename = source.file_name();

    let stored = lifecycle::add_image(
        &ctx.pool,
        storage,
        &ctx.thumbnail_policy,
        destination.id,
        &filename,
        &data,
        &image.caption,
    )
    .await?;
    tracing::info!(
        destination_id = destination.id,
        image_id = stored.id,
        file = %filename,
        "Added image"
    );
    Ok(())
}

pub fn print_report(report: &ImportReport) {
    for error in &report.errors {
        println!("  error: {error}");
    }
    println!(
        "Import completed: {} created, {} updated, {} failed, {} skipped; images: {} added, {} failed",
        report.created,
        report.updated,
        report.failed,
        report.skipped,
        report.images_added,
        report.images_failed
    );
}
