//! Field validation for destinations and their images.
//!
//! Limits mirror the column sizes of the `destinations` and
//! `destination_images` tables.

use crate::error::CoreError;
use crate::slug::{is_valid_slug, MAX_SLUG_LEN};

/// Maximum length of a destination name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of `weather`, `state` and `district`.
pub const MAX_SHORT_FIELD_LEN: usize = 100;

/// Maximum length of an image caption.
pub const MAX_CAPTION_LEN: usize = 200;

/// Maximum length of a map link.
pub const MAX_MAP_LINK_LEN: usize = 500;

/// Validate a destination display name: non-blank, at most [`MAX_NAME_LEN`] chars.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("name must not be empty".into()));
    }
    check_len("name", name, MAX_NAME_LEN)
}

/// Validate one of the short descriptive fields (`weather`, `state`, `district`).
pub fn validate_short_field(field: &str, value: &str) -> Result<(), CoreError> {
    check_len(field, value, MAX_SHORT_FIELD_LEN)
}

/// Validate a map link. Only absolute `http`/`https` URLs are accepted.
pub fn validate_map_link(link: &str) -> Result<(), CoreError> {
    check_len("map_link", link, MAX_MAP_LINK_LEN)?;
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "map_link must be an http(s) URL, got '{link}'"
            ))
        })?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "map_link has no valid host: '{link}'"
        )));
    }
    Ok(())
}

/// Validate an image caption.
pub fn validate_caption(caption: &str) -> Result<(), CoreError> {
    check_len("caption", caption, MAX_CAPTION_LEN)
}

/// Validate a caller-supplied slug. It must already be in canonical form.
pub fn validate_explicit_slug(slug: &str) -> Result<(), CoreError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "slug '{slug}' must be lowercase ASCII letters, digits, '-' or '_' \
             (max {MAX_SLUG_LEN} chars)"
        )))
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len > max {
        Err(CoreError::Validation(format!(
            "{field} must be at most {max} characters (got {len})"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(validate_name("Taj Mahal").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn short_field_rules() {
        assert!(validate_short_field("state", "Uttar Pradesh").is_ok());
        assert!(validate_short_field("state", "").is_ok());
        assert!(validate_short_field("state", &"s".repeat(101)).is_err());
    }

    #[test]
    fn map_link_rules() {
        assert!(validate_map_link("https://goo.gl/maps/5Hsm5").is_ok());
        assert!(validate_map_link("http://maps.example.com?q=agra").is_ok());
        assert!(validate_map_link("ftp://goo.gl/maps").is_err());
        assert!(validate_map_link("https://").is_err());
        assert!(validate_map_link("goo.gl/maps").is_err());
    }

    #[test]
    fn caption_rules() {
        assert!(validate_caption("Sunrise view").is_ok());
        assert!(validate_caption(&"c".repeat(201)).is_err());
    }

    #[test]
    fn explicit_slug_rules() {
        assert!(validate_explicit_slug("golden-temple").is_ok());
        assert!(validate_explicit_slug("Golden Temple").is_err());
        assert!(validate_explicit_slug("").is_err());
    }
}
