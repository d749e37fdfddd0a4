//! Destination entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tdm_core::types::{DbId, Timestamp};

/// A row from the `destinations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Destination {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub weather: String,
    pub state: String,
    pub district: String,
    pub map_link: Option<String>,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new destination.
///
/// When `slug` is `None` it is derived from `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDestination {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub weather: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub district: String,
    pub map_link: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// DTO for updating an existing destination. The slug is never re-derived.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDestination {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub weather: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub map_link: Option<String>,
    pub description: Option<String>,
}
