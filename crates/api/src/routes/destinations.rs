//! Route definitions for the `/destinations` resource and its nested images.

use axum::routing::get;
use axum::Router;

use crate::handlers::{destination, destination_image};
use crate::state::AppState;

/// Routes mounted at `/destinations`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{slug}                    -> get_by_slug
/// PUT    /{slug}                    -> update
/// DELETE /{slug}                    -> delete
///
/// GET    /{slug}/images             -> list_by_destination
/// POST   /{slug}/images             -> upload
/// GET    /{slug}/images/{id}        -> get_by_id
/// PUT    /{slug}/images/{id}        -> update
/// DELETE /{slug}/images/{id}        -> delete
/// ```
pub fn router() -> Router<AppState> {
    let image_routes = Router::new()
        .route(
            "/",
            get(destination_image::list_by_destination).post(destination_image::upload),
        )
        .route(
            "/{id}",
            get(destination_image::get_by_id)
                .put(destination_image::update)
                .delete(destination_image::delete),
        );

    Router::new()
        .route("/", get(destination::list).post(destination::create))
        .route(
            "/{slug}",
            get(destination::get_by_slug)
                .put(destination::update)
                .delete(destination::delete),
        )
        .nest("/{slug}/images", image_routes)
}
