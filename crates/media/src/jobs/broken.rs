//! Broken-reference check: database trusted, storage verified. Read-only.

use serde::Serialize;
use sqlx::SqlitePool;
use tdm_core::storage::Storage;
use tdm_core::types::DbId;
use tdm_db::repositories::DestinationImageRepo;

use crate::error::MediaResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageField {
    Image,
    Thumbnail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BrokenReason {
    EmptyReference,
    Missing,
    Unreadable(String),
}

impl std::fmt::Display for BrokenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyReference => f.write_str("image field is empty"),
            Self::Missing => f.write_str("file does not exist"),
            Self::Unreadable(e) => write!(f, "error reading file: {e}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrokenReference {
    pub image_id: DbId,
    pub destination_id: DbId,
    pub destination_name: String,
    pub field: ImageField,
    pub path: String,
    pub reason: BrokenReason,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BrokenReport {
    pub images_checked: usize,
    pub broken: Vec<BrokenReference>,
}

/// Report every image whose primary or thumbnail reference is unusable.
pub async fn check_broken_references(
    pool: &SqlitePool,
    storage: &dyn Storage,
) -> MediaResult<BrokenReport> {
    let rows = DestinationImageRepo::list_all_with_destination(pool).await?;
    let mut report = BrokenReport {
        images_checked: rows.len(),
        ..Default::default()
    };

    for row in rows {
        let image = &row.image;
        let mut checks = vec![(ImageField::Image, image.image_path.as_str())];
        if let Some(thumb) = image.thumbnail_path.as_deref().filter(|p| !p.is_empty()) {
            checks.push((ImageField::Thumbnail, thumb));
        }

        for (field, path) in checks {
            let reason = if path.is_empty() {
                Some(BrokenReason::EmptyReference)
            } else {
                probe(storage, path).await
            };
            if let Some(reason) = reason {
                tracing::warn!(
                    image_id = image.id,
                    destination = %row.destination_name,
                    path,
                    reason = %reason,
                    "Broken image reference"
                );
                report.broken.push(BrokenReference {
                    image_id: image.id,
                    destination_id: image.destination_id,
                    destination_name: row.destination_name.clone(),
                    field,
                    path: path.to_string(),
                    reason,
                });
            }
        }
    }

    Ok(report)
}

async fn probe(storage: &dyn Storage, path: &str) -> Option<BrokenReason> {
    match storage.exists(path).await {
        Ok(false) => return Some(BrokenReason::Missing),
        Err(e) => return Some(BrokenReason::Unreadable(e.to_string())),
        Ok(true) => {}
    }
    match storage.open(path).await {
        Ok(_) => None,
        Err(e) if e.is_not_found() => Some(BrokenReason::Missing),
        Err(e) => Some(BrokenReason::Unreadable(e.to_string())),
    }
}
