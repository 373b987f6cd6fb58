//! Cleaning of free-text names and titles.
//!
//! Output is safe to embed in a SPARQL string literal: double quotes,
//! backslashes, and control characters are removed.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r#"["\\\p{Cc}]"#).unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalise a name or title for comparison and storage.
///
/// Collapses whitespace runs, trims, and drops trailing periods
/// (PubMed titles end with one, graph labels usually don't).
pub fn clean_name(raw: &str) -> String {
    // Control characters include \n and \t, so turn them into spaces first.
    let spaced = raw.replace(['\n', '\r', '\t'], " ");
    let stripped = UNSAFE_CHARS.replace_all(&spaced, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    collapsed.trim_end_matches('.').trim_end().to_string()
}
