//! Handlers for `/destinations/{slug}/images`.
//!
//! An image requested under a destination it does not belong to is a 404.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tdm_core::destination::validate_caption;
use tdm_core::error::CoreError;
use tdm_core::types::{DbId, Timestamp};
use tdm_db::models::image::{DestinationImage, UpdateDestinationImage};
use tdm_db::repositories::DestinationImageRepo;
use tdm_media::lifecycle;

use crate::error::{AppError, AppResult};
use crate::handlers::destination::find_by_slug;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Image as returned by the API: storage paths plus absolute URLs.
#[derive(Debug, Serialize)]
pub struct ImageView {
    pub id: DbId,
    pub destination_id: DbId,
    /// Absolute URL of the primary image.
    pub image: String,
    /// Absolute URL of the thumbnail, if one exists.
    pub thumbnail: Option<String>,
    pub image_path: String,
    pub thumbnail_path: Option<String>,
    pub caption: String,
    pub is_optimized: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ImageView {
    pub fn new(state: &AppState, image: DestinationImage) -> Self {
        let thumbnail_path = image.thumbnail_path.filter(|p| !p.is_empty());
        Self {
            id: image.id,
            destination_id: image.destination_id,
            image: state.media_url(&image.image_path),
            thumbnail: thumbnail_path.as_deref().map(|p| state.media_url(p)),
            image_path: image.image_path,
            thumbnail_path,
            caption: image.caption,
            is_optimized: image.is_optimized,
            created_at: image.created_at,
            updated_at: image.updated_at,
        }
    }
}

/// Request body for `PUT /destinations/{slug}/images/{id}`.
pub type UpdateImageRequest = UpdateDestinationImage;

fn image_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "DestinationImage",
        id,
    })
}

/// GET /api/v1/destinations/{slug}/images
pub async fn list_by_destination(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<Vec<ImageView>>>> {
    let destination = find_by_slug(&state, &slug).await?;
    let images = DestinationImageRepo::list_by_destination(&state.pool, destination.id)
        .await?
        .into_iter()
        .map(|image| ImageView::new(&state, image))
        .collect();
    Ok(Json(DataResponse { data: images }))
}

/// GET /api/v1/destinations/{slug}/images/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((slug, id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<ImageView>>> {
    let destination = find_by_slug(&state, &slug).await?;
    let image = DestinationImageRepo::find_for_destination(&state.pool, destination.id, id)
        .await?
        .ok_or_else(|| image_not_found(id))?;
    Ok(Json(DataResponse {
        data: ImageView::new(&state, image),
    }))
}

/// POST /api/v1/destinations/{slug}/images
///
/// Multipart upload with a required `file` field and an optional `caption`.
/// The primary file is stored first, then its thumbnail is derived. A failed
/// thumbnail does not fail the upload.
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<ImageView>>)> {
    let destination = find_by_slug(&state, &slug).await?;

    let mut file_data: Option<(String, Vec<u8>)> = None;
    let mut caption = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload.jpg").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file_data = Some((filename, data.to_vec()));
            }
            "caption" => {
                caption = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            _ => {} // ignore unknown fields
        }
    }

    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let image = lifecycle::add_image(
        &state.pool,
        state.storage.as_ref(),
        &state.thumbnail_policy,
        destination.id,
        &filename,
        &data,
        caption.trim(),
    )
    .await?;

    tracing::info!(
        image_id = image.id,
        destination_id = destination.id,
        user_id = user.user_id,
        bytes = data.len(),
        has_thumbnail = image.thumbnail_path.is_some(),
        "Uploaded destination image"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ImageView::new(&state, image),
        }),
    ))
}

/// PUT /api/v1/destinations/{slug}/images/{id}
///
/// Only the caption is editable; replacing the file means uploading a new image.
pub async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((slug, id)): Path<(String, DbId)>,
    Json(input): Json<UpdateImageRequest>,
) -> AppResult<Json<DataResponse<ImageView>>> {
    if let Some(caption) = &input.caption {
        validate_caption(caption)?;
    }
    let destination = find_by_slug(&state, &slug).await?;
    DestinationImageRepo::find_for_destination(&state.pool, destination.id, id)
        .await?
        .ok_or_else(|| image_not_found(id))?;

    let image = DestinationImageRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| image_not_found(id))?;
    Ok(Json(DataResponse {
        data: ImageView::new(&state, image),
    }))
}

/// DELETE /api/v1/destinations/{slug}/images/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path((slug, id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let destination = find_by_slug(&state, &slug).await?;
    let summary = lifecycle::delete_image(&state.pool, state.storage.as_ref(), destination.id, id)
        .await?
        .ok_or_else(|| image_not_found(id))?;

    tracing::info!(
        image_id = id,
        user_id = user.user_id,
        files_deleted = summary.files_deleted,
        files_pending = summary.files_pending,
        "Deleted destination image"
    );
    Ok(StatusCode::NO_CONTENT)
}
