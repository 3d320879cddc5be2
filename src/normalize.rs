//! Pure text normalization shared by every write path.
//!
//! Tags are stored lower-cased and trimmed; stickers and statuses are
//! trimmed with their case preserved. Nothing here touches the database,
//! so the rules are testable on their own.

use itertools::Itertools;

use crate::error::ValidationError;

/// Characters that may never appear in a stored tag.
pub const FORBIDDEN_TAG_CHARS: [char; 5] = [' ', '\n', '\r', ',', '"'];

/// Lower-case and trim a raw tag, rejecting empty results and forbidden
/// characters. This is the one place the tag rules live.
pub fn normalize_tag(raw: &str) -> Result<String, ValidationError> {
    let tag = raw.to_lowercase().trim().to_string();
    if tag.is_empty() {
        return Err(ValidationError::EmptyTag);
    }
    if let Some(ch) = tag.chars().find(|c| FORBIDDEN_TAG_CHARS.contains(c)) {
        return Err(ValidationError::ForbiddenCharacter { tag, ch });
    }
    Ok(tag)
}

/// Sticker identifiers keep their case; only surrounding whitespace goes.
pub fn normalize_sticker(raw: &str) -> String {
    raw.trim().to_string()
}

/// Status text is trimmed only, case preserved.
pub fn normalize_status(raw: &str) -> String {
    raw.trim().to_string()
}

/// Lower-case and trim every tag in a match/removal list without rejecting
/// anything. A tag that would fail [`normalize_tag`] simply matches no row.
pub fn normalize_tag_list<S: AsRef<str>>(raws: &[S]) -> Vec<String> {
    raws.iter()
        .map(|raw| raw.as_ref().to_lowercase().trim().to_string())
        .collect_vec()
}
