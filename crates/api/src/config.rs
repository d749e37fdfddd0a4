use tdm_core::error::CoreError;
use tdm_core::storage::MediaSettings;

use crate::auth::jwt::JwtConfig;

/// Default upload limit for image multipart bodies (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body for image uploads.
    pub max_upload_bytes: usize,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Media root, public media URL and extra storage backends.
    pub media: MediaSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `MAX_UPLOAD_BYTES`     | `10485760`                 |
    ///
    /// JWT and media settings are read by [`JwtConfig::from_env`] and
    /// [`MediaSettings::from_env`].
    pub fn from_env() -> Result<Self, CoreError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", 30)?;
        let max_upload_bytes: usize = parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            jwt: JwtConfig::from_env()?,
            media: MediaSettings::from_env()?,
        })
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T, CoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::Validation(format!("{key} is invalid: {e}"))),
        _ => Ok(default),
    }
}
