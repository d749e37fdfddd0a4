//! Media settings and named-backend configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::CoreError;

use super::backend::Storage;
use super::local::LocalStorage;
use super::memory::MemoryStorage;
use super::StorageRegistry;

/// Name of the backend rooted at `MEDIA_ROOT`.
pub const DEFAULT_BACKEND: &str = "default";

// ---------------------------------------------------------------------------
// Backend config validation
// ---------------------------------------------------------------------------

/// A validated backend definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Local { base_path: PathBuf },
    Memory,
}

impl BackendConfig {
    /// Instantiate the backend under `name`.
    pub fn build(&self, name: &str) -> Arc<dyn Storage> {
        match self {
            Self::Local { base_path } => Arc::new(LocalStorage::new(name, base_path.clone())),
            Self::Memory => Arc::new(MemoryStorage::new(name)),
        }
    }
}

/// Validate that `config` contains the required keys for `backend_type`.
///
/// - `local`: requires `base_path` (string)
/// - `memory`: no options
pub fn validate_backend_config(
    backend_type: &str,
    config: &serde_json::Value,
) -> Result<BackendConfig, CoreError> {
    let obj = config
        .as_object()
        .ok_or_else(|| CoreError::Validation("Backend config must be a JSON object".into()))?;

    match backend_type {
        "local" => {
            let base_path = require_string_field(obj, "base_path", "local")?;
            Ok(BackendConfig::Local {
                base_path: PathBuf::from(base_path),
            })
        }
        "memory" => Ok(BackendConfig::Memory),
        other => Err(CoreError::Validation(format!(
            "Unknown backend type '{other}'. Must be one of: local, memory"
        ))),
    }
}

/// Parse the `STORAGE_BACKENDS` JSON object into named configs.
///
/// Shape: `{"archive": {"type": "local", "base_path": "/mnt/archive"}}`.
pub fn parse_backends(raw: &str) -> Result<BTreeMap<String, BackendConfig>, CoreError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| CoreError::Validation(format!("STORAGE_BACKENDS is not valid JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| CoreError::Validation("STORAGE_BACKENDS must be a JSON object".into()))?;

    let mut backends = BTreeMap::new();
    for (name, config) in obj {
        if name == DEFAULT_BACKEND {
            return Err(CoreError::Validation(format!(
                "Backend name '{DEFAULT_BACKEND}' is reserved for MEDIA_ROOT"
            )));
        }
        let backend_type = config
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                CoreError::Validation(format!("Backend '{name}' is missing a string 'type'"))
            })?;
        backends.insert(name.clone(), validate_backend_config(backend_type, config)?);
    }
    Ok(backends)
}

/// Helper: ensure an object has a non-empty string field.
fn require_string_field<'a>(
    obj: &'a serde_json::Map<String, serde_json::Value>,
    field: &str,
    backend_type: &str,
) -> Result<&'a str, CoreError> {
    match obj.get(field) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s),
        _ => Err(CoreError::Validation(format!(
            "Backend type '{backend_type}' requires a non-empty string field '{field}' in config"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Media settings
// ---------------------------------------------------------------------------

/// Where media lives and how it is addressed publicly.
#[derive(Debug, Clone)]
pub struct MediaSettings {
    /// Root directory of the `default` backend.
    pub media_root: PathBuf,
    /// Public URL prefix for stored files, always ending in `/`.
    pub media_url: String,
    /// Additional named backends.
    pub extra_backends: BTreeMap<String, BackendConfig>,
}

impl MediaSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var            | Default                         |
    /// |--------------------|---------------------------------|
    /// | `MEDIA_ROOT`       | `media`                         |
    /// | `MEDIA_URL`        | `http://localhost:3000/media/`  |
    /// | `STORAGE_BACKENDS` | unset                           |
    pub fn from_env() -> Result<Self, CoreError> {
        let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into());
        let media_url = std::env::var("MEDIA_URL")
            .unwrap_or_else(|_| "http://localhost:3000/media/".into());
        let extra_backends = match std::env::var("STORAGE_BACKENDS") {
            Ok(raw) if !raw.trim().is_empty() => parse_backends(&raw)?,
            _ => BTreeMap::new(),
        };
        Ok(Self::new(media_root, media_url, extra_backends))
    }

    pub fn new(
        media_root: impl Into<PathBuf>,
        media_url: impl Into<String>,
        extra_backends: BTreeMap<String, BackendConfig>,
    ) -> Self {
        let mut media_url = media_url.into();
        if !media_url.ends_with('/') {
            media_url.push('/');
        }
        Self {
            media_root: media_root.into(),
            media_url,
            extra_backends,
        }
    }

    /// Absolute public URL of a stored file.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.media_url, path.trim_start_matches('/'))
    }

    /// Build the registry: `default` at `media_root` plus every extra backend.
    pub fn build_registry(&self) -> StorageRegistry {
        let mut registry = StorageRegistry::new();
        registry.insert(Arc::new(LocalStorage::new(
            DEFAULT_BACKEND,
            self.media_root.clone(),
        )));
        for (name, config) in &self.extra_backends {
            registry.insert(config.build(name));
        }
        registry
    }
}
