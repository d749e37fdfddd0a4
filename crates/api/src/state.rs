use std::sync::Arc;

use tdm_core::imaging::ThumbnailPolicy;
use tdm_core::storage::Storage;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tdm_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Backend that holds destination images (the `default` backend).
    pub storage: Arc<dyn Storage>,
    /// Thumbnail policy applied on upload.
    pub thumbnail_policy: ThumbnailPolicy,
}

impl AppState {
    /// Absolute public URL of a stored file.
    pub fn media_url(&self, path: &str) -> String {
        self.config.media.url_for(path)
    }
}
