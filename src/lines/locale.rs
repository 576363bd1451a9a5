//! Locale code handling.
//!
//! Locale codes are BCP-47 style (`en`, `en-US`, `pt-BR`). The runtime only
//! ever needs the primary language subtag: whether a provider's active locale
//! resolves from the project's compiled base table is a prefix match on that
//! subtag alone.

/// Primary language subtag of a locale code: `"en-US"` → `"en"`.
///
/// `_` separators are tolerated alongside the standard `-`.
pub fn primary_subtag(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

/// Whether the active locale resolves from the project's base table.
///
/// Matches on the primary language subtag, case-insensitively: a provider
/// configured for `"en-US"` matches a base locale of `"en"`, while `"fr-FR"`
/// does not.
pub fn matches_base_locale(active: &str, base: &str) -> bool {
    !active.is_empty() && primary_subtag(active).eq_ignore_ascii_case(primary_subtag(base))
}

/// Loose shape check for a locale code, used by config validation: a 2-8
/// letter primary subtag, then 1-8 character alphanumeric subtags.
pub fn is_valid_locale_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let primary = parts.next().unwrap_or("");
    if !(2..=8).contains(&primary.len()) || !primary.bytes().all(|b| b.is_ascii_alphabetic()) {
        return false;
    }
    parts.all(|p| (1..=8).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_alphanumeric()))
}
