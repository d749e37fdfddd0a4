//! Slug derivation for destinations.
//!
//! A slug is the stable, URL-safe identifier of a destination. It is derived
//! from the display name once, at creation, and never re-derived afterwards.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Fallback used when a name contains nothing slug-worthy (e.g. `"!!!"`).
pub const FALLBACK_SLUG: &str = "destination";

/// Maximum slug length, matching the `slug` column limit.
pub const MAX_SLUG_LEN: usize = 200;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("static regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("static regex"));

/// Derive a slug from a display name.
///
/// Folds to ASCII through NFKD decomposition (combining marks and any other
/// non-ASCII residue are dropped), lowercases, drops everything except ASCII
/// alphanumerics, whitespace, `_` and `-`, collapses whitespace/hyphen runs into a single `-` and trims
/// leading/trailing `-` and `_`. Never returns an empty string.
///
/// ```
/// use tdm_core::slug::slugify;
///
/// assert_eq!(slugify("Taj Mahal"), "taj-mahal");
/// assert_eq!(slugify("  Golden -- Temple!  "), "golden-temple");
/// assert_eq!(slugify("Café Goa"), "cafe-goa");
/// ```
pub fn slugify(name: &str) -> String {
    let folded: String = name.nfkd().filter(char::is_ascii).collect();
    let lowered = folded.to_ascii_lowercase();
    let cleaned = DISALLOWED.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(cleaned.trim(), "-");
    let trimmed = joined.trim_matches(|c| c == '-' || c == '_');

    let mut slug: String = trimmed.chars().take(MAX_SLUG_LEN).collect();
    // Truncation can expose a trailing separator.
    while slug.ends_with('-') || slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Build the `n`-th collision candidate for a derived slug.
///
/// `n <= 1` yields the base slug itself; higher values append `-{n}`, keeping
/// the result within [`MAX_SLUG_LEN`].
pub fn numbered_candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        return base.to_string();
    }
    let suffix = format!("-{n}");
    let keep = MAX_SLUG_LEN.saturating_sub(suffix.len());
    let head: String = base.chars().take(keep).collect();
    format!("{}{suffix}", head.trim_end_matches(['-', '_']))
}

/// Whether `slug` is already in canonical form (what [`slugify`] would keep).
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= MAX_SLUG_LEN && slugify(slug) == slug
}
