//! Destination image model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tdm_core::types::{DbId, Timestamp};

/// A row from the `destination_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DestinationImage {
    pub id: DbId,
    pub destination_id: DbId,
    /// Logical storage path of the primary asset.
    pub image_path: String,
    /// Logical storage path of the derived thumbnail, if any.
    pub thumbnail_path: Option<String>,
    pub caption: String,
    pub is_optimized: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DestinationImage {
    /// Every non-empty storage path this row references.
    pub fn referenced_paths(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.image_path.as_str())
            .chain(self.thumbnail_path.as_deref())
            .filter(|p| !p.is_empty())
    }
}

/// DTO for creating a new destination image.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDestinationImage {
    pub destination_id: DbId,
    pub image_path: String,
    #[serde(default)]
    pub caption: String,
}

/// DTO for updating an existing destination image.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDestinationImage {
    pub caption: Option<String>,
}

/// An image joined with the name of its destination, for reports.
#[derive(Debug, Clone, FromRow)]
pub struct ImageWithDestination {
    #[sqlx(flatten)]
    pub image: DestinationImage,
    pub destination_name: String,
}
