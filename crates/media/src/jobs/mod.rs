//! Batch maintenance passes over every destination image.
//!
//! Every job runs sequentially and keeps going past per-item failures; only
//! setup problems (bad backend names, an unreachable database) abort a run.

pub mod broken;
pub mod cleanup;
pub mod migrate;
pub mod optimize;
pub mod thumbnails;

use serde::Serialize;
use tdm_core::types::DbId;

/// A per-item failure, kept for the job report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub image_id: DbId,
    pub path: String,
    pub message: String,
}

impl ItemError {
    pub fn new(image_id: DbId, path: impl Into<String>, message: impl ToString) -> Self {
        Self {
            image_id,
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "image {} ({}): {}", self.image_id, self.path, self.message)
    }
}
