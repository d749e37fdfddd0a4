//! Pending file cleanup model.

use serde::Serialize;
use sqlx::FromRow;
use tdm_core::types::{DbId, Timestamp};

/// A file whose deletion failed after its owning row was removed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingFileCleanup {
    pub id: DbId,
    /// Registry name of the backend holding the file.
    pub backend: String,
    pub path: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
