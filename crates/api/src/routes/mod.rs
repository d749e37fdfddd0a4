pub mod auth;
pub mod destinations;
pub mod health;
pub mod media;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
///
/// /destinations                                    list (public), create (auth)
/// /destinations/{slug}                             get (public), update, delete (auth)
/// /destinations/{slug}/images                      list (public), upload (auth)
/// /destinations/{slug}/images/{id}                 get (public), update, delete (auth)
/// ```
///
/// `/health` and `/media/{*path}` are mounted at the root by
/// [`crate::router::build_app_router`].
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/destinations", destinations::router())
}
