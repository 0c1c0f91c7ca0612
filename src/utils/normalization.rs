//! Name normalization and token-aligned matching
//!
//! Crop, district and state names are compared through a normalized key:
//! trimmed, lowercased, surrounding quotes removed and internal whitespace
//! collapsed to single spaces. Display strings keep the casing from the table.

/// Build the matching key for a table cell or a user message
///
/// "  Pearl   Millet " → "pearl millet"
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean a cell for display: trim whitespace and surrounding quotes only
pub fn display_name(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

/// Find the first occurrence of `needle` in `haystack` that is not part of a
/// longer word
///
/// Both arguments are expected to be normalized keys. Returns the byte
/// offset of the match.
pub fn find_token(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    haystack.match_indices(needle).map(|(idx, _)| idx).find(|&idx| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + needle.len()..].chars().next();
        !before.map_or(false, char::is_alphanumeric) && !after.map_or(false, char::is_alphanumeric)
    })
}
