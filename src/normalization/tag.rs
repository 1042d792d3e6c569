//! Player tag canonicalization.
//!
//! Tags arrive in several spellings: `#ABC123`, `abc123`, `%23abc123` (the
//! sigil percent-encoded in a URL path). All of them must resolve to one
//! canonical form before they touch the database or the upstream API.

/// Canonical form of a player tag: uppercase body with a leading `#` sigil.
///
/// Accepts the sigil raw (`#ABC`), percent-encoded (`%23ABC`), or absent
/// (`ABC`). Returns `None` when the remaining body is empty or contains
/// anything other than ASCII alphanumerics.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("%23")
        .or_else(|| trimmed.strip_prefix('#'))
        .unwrap_or(trimmed);

    if body.is_empty() || !body.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(format!("#{}", body.to_ascii_uppercase()))
}

/// Percent-encode a canonical tag for use in an upstream URL path segment
/// (the `#` sigil becomes `%23`).
pub fn encode_tag_for_path(tag: &str) -> String {
    urlencoding::encode(tag).into_owned()
}
