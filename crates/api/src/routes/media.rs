use axum::routing::get;
use axum::Router;

use crate::handlers::media;
use crate::state::AppState;

/// Mount media file serving at `/media/{*path}` (root-level).
pub fn router() -> Router<AppState> {
    Router::new().route("/media/{*path}", get(media::serve))
}
