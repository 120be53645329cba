//! Original-resource URL scanner
//!
//! Detail pages embed the original resource URL in inline script data, not
//! markup, so this is a string pattern match over the raw body rather than
//! tree parsing. The matched value carries JSON backslash escapes that must
//! be stripped before use.

use regex::Regex;

/// Scans a detail page body for the embedded original-resource URL.
///
/// Returns the first match with escape backslashes removed, or `None` when
/// the page carries no original marker (deleted work, age-gated page, or a
/// markup change).
pub fn find_original_url(body: &str) -> Option<String> {
    let marker = Regex::new(r#""original":"([^"]+)""#).ok()?;

    let captures = marker.captures(body)?;
    let raw = captures.get(1)?.as_str();

    Some(raw.replace('\\', ""))
}
