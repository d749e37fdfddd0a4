use tdm_core::error::CoreError;
use tdm_core::imaging::ImagingError;
use tdm_core::storage::StorageError;

/// Errors raised by lifecycle operations and job setup.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Imaging(#[from] ImagingError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type MediaResult<T> = Result<T, MediaError>;
