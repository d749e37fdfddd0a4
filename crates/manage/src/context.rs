use std::sync::Arc;

use anyhow::Context;
use tdm_core::imaging::ThumbnailPolicy;
use tdm_core::storage::{MediaSettings, Storage, StorageRegistry};
use tdm_db::DbPool;

/// Host used for sitemap and robots output when `SITE_DOMAIN` is unset.
pub const DEFAULT_SITE_DOMAIN: &str = "example.com";

/// Everything a command needs: database, storage backends and site settings.
pub struct ManageContext {
    pub pool: DbPool,
    pub media: MediaSettings,
    pub registry: StorageRegistry,
    pub site_domain: String,
    pub thumbnail_policy: ThumbnailPolicy,
}

impl ManageContext {
    /// Connect to `DATABASE_URL`, apply migrations and build the storage registry.
    pub async fn from_env() -> anyhow::Result<Self> {
        let media = MediaSettings::from_env().context("Invalid media configuration")?;

        let database_url = tdm_db::database_url_from_env();
        let pool = tdm_db::create_pool(&database_url)
            .await
            .with_context(|| format!("Failed to open database '{database_url}'"))?;
        tdm_db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let site_domain = std::env::var("SITE_DOMAIN")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SITE_DOMAIN.to_string());

        Ok(Self::new(pool, media, site_domain))
    }

    pub fn new(pool: DbPool, media: MediaSettings, site_domain: impl Into<String>) -> Self {
        let registry = media.build_registry();
        Self {
            pool,
            media,
            registry,
            site_domain: site_domain.into(),
            thumbnail_policy: ThumbnailPolicy::default(),
        }
    }

    /// Replace the storage registry (tests swap in in-memory backends).
    pub fn with_registry(mut self, registry: StorageRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The backend rooted at the media root.
    pub fn storage(&self) -> anyhow::Result<Arc<dyn Storage>> {
        Ok(self.registry.default_backend()?)
    }
}
