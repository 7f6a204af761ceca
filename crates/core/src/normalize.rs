//! Cleanup of free text returned by OCR.

use once_cell::sync::Lazy;
use regex::Regex;

// Word characters are ASCII-only, matching the OCR backend's own tokenisation.
static NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s.%/,-]").expect("noise pattern is valid"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Strips OCR noise from `text`.
///
/// Removes every character other than ASCII word characters, whitespace, `.`, `%`, `/`, `,` and
/// `-`; collapses whitespace runs to a single space; trims both ends. Total and idempotent.
pub fn normalize(text: &str) -> String {
    let stripped = NOISE.replace_all(text, "");
    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// [`normalize`] for a value that may be absent. `None` yields `""`.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}
