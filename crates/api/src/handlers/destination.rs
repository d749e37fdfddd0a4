//! Handlers for the `/destinations` resource.
//!
//! Destinations are addressed by slug. Every response embeds the
//! destination's images with absolute media URLs.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tdm_core::destination::{
    validate_explicit_slug, validate_map_link, validate_name, validate_short_field,
};
use tdm_core::types::DbId;
use tdm_db::models::destination::{CreateDestination, Destination, UpdateDestination};
use tdm_db::repositories::{DestinationImageRepo, DestinationRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::destination_image::ImageView;
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, PageMeta, PagedResponse};
use crate::state::AppState;

/// Default page size for destination listings.
pub const DEFAULT_PER_PAGE: i64 = 20;
/// Largest page size a client may request.
pub const MAX_PER_PAGE: i64 = 100;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /destinations`.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Clamp to `page >= 1` and `1 <= per_page <= MAX_PER_PAGE`.
    pub fn normalized(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }
}

/// A destination together with its images.
#[derive(Debug, Serialize)]
pub struct DestinationView {
    #[serde(flatten)]
    pub destination: Destination,
    pub images: Vec<ImageView>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Look up a destination by slug or fail with 404.
pub(crate) async fn find_by_slug(state: &AppState, slug: &str) -> AppResult<Destination> {
    DestinationRepo::find_by_slug(&state.pool, slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Destination '{slug}'")))
}

async fn with_images(state: &AppState, destination: Destination) -> AppResult<DestinationView> {
    let images = DestinationImageRepo::list_by_destination(&state.pool, destination.id)
        .await?
        .into_iter()
        .map(|image| ImageView::new(state, image))
        .collect();
    Ok(DestinationView {
        destination,
        images,
    })
}

fn validate_create(input: &CreateDestination) -> AppResult<()> {
    validate_name(&input.name)?;
    validate_short_field("weather", &input.weather)?;
    validate_short_field("state", &input.state)?;
    validate_short_field("district", &input.district)?;
    if let Some(link) = input.map_link.as_deref().filter(|l| !l.is_empty()) {
        validate_map_link(link)?;
    }
    if let Some(slug) = input.slug.as_deref().filter(|s| !s.is_empty()) {
        validate_explicit_slug(slug)?;
    }
    Ok(())
}

fn validate_update(input: &UpdateDestination) -> AppResult<()> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }
    for (field, value) in [
        ("weather", &input.weather),
        ("state", &input.state),
        ("district", &input.district),
    ] {
        if let Some(value) = value {
            validate_short_field(field, value)?;
        }
    }
    if let Some(link) = input.map_link.as_deref().filter(|l| !l.is_empty()) {
        validate_map_link(link)?;
    }
    if let Some(slug) = &input.slug {
        validate_explicit_slug(slug)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/destinations
///
/// One page of destinations ordered by name, each with its images.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<PagedResponse<DestinationView>>> {
    let (page, per_page) = params.normalized();
    let offset = (page - 1) * per_page;

    let destinations = DestinationRepo::list(&state.pool, per_page, offset).await?;
    let total = DestinationRepo::count(&state.pool).await?;

    let ids: Vec<DbId> = destinations.iter().map(|d| d.id).collect();
    let mut images_by_destination: HashMap<DbId, Vec<ImageView>> = HashMap::new();
    for image in DestinationImageRepo::list_by_destinations(&state.pool, &ids).await? {
        images_by_destination
            .entry(image.destination_id)
            .or_default()
            .push(ImageView::new(&state, image));
    }

    let data = destinations
        .into_iter()
        .map(|destination| DestinationView {
            images: images_by_destination
                .remove(&destination.id)
                .unwrap_or_default(),
            destination,
        })
        .collect();

    Ok(Json(PagedResponse {
        data,
        meta: PageMeta {
            page,
            per_page,
            total,
        },
    }))
}

/// POST /api/v1/destinations
///
/// Without a `slug` one is derived from the name, suffixed `-2`, `-3`, ...
/// on collision. An explicit duplicate slug is a 409.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut input): Json<CreateDestination>,
) -> AppResult<(StatusCode, Json<DataResponse<DestinationView>>)> {
    if input.map_link.as_deref() == Some("") {
        input.map_link = None;
    }
    validate_create(&input)?;

    let destination = DestinationRepo::create(&state.pool, &input).await?;
    tracing::info!(
        destination_id = destination.id,
        slug = %destination.slug,
        user_id = user.user_id,
        "Created destination"
    );

    let view = with_images(&state, destination).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/destinations/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<DestinationView>>> {
    let destination = find_by_slug(&state, &slug).await?;
    let view = with_images(&state, destination).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/destinations/{slug}
///
/// Partial update. Renaming never re-derives the slug; a new slug must be
/// given explicitly.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
    Json(input): Json<UpdateDestination>,
) -> AppResult<Json<DataResponse<DestinationView>>> {
    validate_update(&input)?;
    let existing = find_by_slug(&state, &slug).await?;

    let destination = DestinationRepo::update(&state.pool, existing.id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Destination '{slug}'")))?;
    tracing::info!(destination_id = destination.id, user_id = user.user_id, "Updated destination");

    let view = with_images(&state, destination).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/destinations/{slug}
///
/// Rows go in one transaction; image files are removed afterwards and
/// failures are queued for `purge-pending`.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    let destination = find_by_slug(&state, &slug).await?;
    let summary =
        tdm_media::lifecycle::delete_destination(&state.pool, state.storage.as_ref(), destination.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Destination '{slug}'")))?;

    tracing::info!(
        destination_id = destination.id,
        user_id = user.user_id,
        files_deleted = summary.files_deleted,
        files_pending = summary.files_pending,
        "Deleted destination"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_are_clamped() {
        let params = PageParams {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(params.normalized(), (1, MAX_PER_PAGE));

        let params = PageParams {
            page: None,
            per_page: None,
        };
        assert_eq!(params.normalized(), (1, DEFAULT_PER_PAGE));

        let params = PageParams {
            page: Some(3),
            per_page: Some(-5),
        };
        assert_eq!(params.normalized(), (3, 1));
    }

    #[test]
    fn create_validation_rejects_bad_fields() {
        let mut input = CreateDestination {
            name: "Taj Mahal".into(),
            ..Default::default()
        };
        assert!(validate_create(&input).is_ok());

        input.map_link = Some("not a url".into());
        assert!(validate_create(&input).is_err());

        input.map_link = None;
        input.slug = Some("Not A Slug".into());
        assert!(validate_create(&input).is_err());

        input.slug = None;
        input.name = "  ".into();
        assert!(validate_create(&input).is_err());
    }

    #[test]
    fn update_validation_only_checks_present_fields() {
        assert!(validate_update(&UpdateDestination::default()).is_ok());
        let input = UpdateDestination {
            state: Some("s".repeat(101)),
            ..Default::default()
        };
        assert!(validate_update(&input).is_err());
    }
}
