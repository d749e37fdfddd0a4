//! Storage path conventions for destination images.
//!
//! Primary assets live under a per-destination directory so two destinations
//! can never collide. Thumbnails mirror the primary's directory under
//! `thumbnails/` and keep its full file name, so distinct primaries always
//! get distinct thumbnails.
//!
//! ```text
//! destinations/{destination_id}/{uuid}.{ext}                        primary
//! thumbnails/destinations/{destination_id}/thumb_{uuid}.{ext}.jpg   thumbnail
//! ```

use uuid::Uuid;

use crate::types::DbId;

/// Root directory of primary destination images.
pub const DESTINATIONS_DIR: &str = "destinations";

/// Namespace of derived thumbnails.
pub const THUMBNAILS_DIR: &str = "thumbnails";

/// Prefix applied to the primary stem when naming a thumbnail.
pub const THUMBNAIL_PREFIX: &str = "thumb_";

/// Extension used when the upload has none (or an unusable one).
pub const DEFAULT_EXTENSION: &str = "jpg";

const MAX_EXTENSION_LEN: usize = 8;

/// Directory that holds every primary image of one destination.
pub fn destination_dir(destination_id: DbId) -> String {
    format!("{DESTINATIONS_DIR}/{destination_id}")
}

/// Build a fresh primary image path for an upload named `original_filename`.
///
/// Only the extension of the original name is kept; the stem is a random
/// UUID so re-uploads of `photo.jpg` never overwrite each other.
pub fn primary_image_path(destination_id: DbId, original_filename: &str) -> String {
    let ext = normalized_extension(original_filename);
    format!(
        "{}/{}.{ext}",
        destination_dir(destination_id),
        Uuid::new_v4().simple()
    )
}

/// Derive the thumbnail path for a primary image path.
///
/// The mapping is injective: the primary's directory and full file name
/// (extension included) both survive into the thumbnail path.
///
/// ```
/// use tdm_core::naming::thumbnail_path;
///
/// assert_eq!(
///     thumbnail_path("destinations/4/abc123.png"),
///     "thumbnails/destinations/4/thumb_abc123.png.jpg"
/// );
/// ```
pub fn thumbnail_path(primary_path: &str) -> String {
    match primary_path.rsplit_once('/') {
        Some((dir, basename)) => {
            format!("{THUMBNAILS_DIR}/{dir}/{THUMBNAIL_PREFIX}{basename}.jpg")
        }
        None => format!("{THUMBNAILS_DIR}/{THUMBNAIL_PREFIX}{primary_path}.jpg"),
    }
}

/// Whether `path` lies inside the derived thumbnail namespace.
pub fn is_thumbnail_path(path: &str) -> bool {
    path.starts_with(THUMBNAILS_DIR) && path[THUMBNAILS_DIR.len()..].starts_with('/')
}

/// Whether `path` is a primary image path belonging to `destination_id`.
pub fn belongs_to_destination(path: &str, destination_id: DbId) -> bool {
    let dir = destination_dir(destination_id);
    path.strip_prefix(&dir)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}

/// Lowercased, alphanumeric-only extension of `filename`, or [`DEFAULT_EXTENSION`].
pub fn normalized_extension(filename: &str) -> String {
    let basename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match basename.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}
