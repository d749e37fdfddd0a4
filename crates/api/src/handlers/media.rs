//! Serves stored media files from the `default` backend.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use tdm_core::imaging::mime_type_for_path;
use tdm_core::storage::{is_hidden_path, validate_path, StorageError};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /media/{*path}
///
/// The content type is guessed from the extension. Hidden files (in-flight
/// temporary writes) are never served.
pub async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_path(&path).map_err(|_| AppError::NotFound(format!("Media file '{path}'")))?;
    if is_hidden_path(&path) {
        return Err(AppError::NotFound(format!("Media file '{path}'")));
    }

    let data = match state.storage.open(&path).await {
        Ok(data) => data,
        Err(StorageError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("Media file '{path}'")))
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (CONTENT_TYPE, mime_type_for_path(&path)),
            (CACHE_CONTROL, "public, max-age=3600"),
        ],
        data,
    ))
}
