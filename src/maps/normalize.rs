use lazy_static::lazy_static;
use regex::Regex;

use crate::common::ARXIV_PREFIX;

lazy_static! {
    /// Bare numeric arXiv identifier as HAL sometimes exports it:
    /// new-style id without the namespace prefix, e.g. "1234.5678"
    static ref BARE_NUMERIC_ARXIV: Regex = Regex::new(r"^\d+(\.\d+)?$").unwrap();
}

/// Prefix a bare numeric arXiv identifier with the canonical namespace.
/// Already-prefixed and old-style identifiers ("hep-ph/9901234") are kept
/// as-is, since those match the local convention directly.
pub fn normalize_arxiv_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if BARE_NUMERIC_ARXIV.is_match(trimmed) {
        format!("{}{}", ARXIV_PREFIX, trimmed)
    } else {
        trimmed.to_string()
    }
}

/// DOIs are case-insensitive; keys are lowercased on both insert and lookup
pub fn normalize_doi(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parse a harvested local record id. Only positive integers are valid.
pub fn parse_recid(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|&recid| recid > 0)
}
