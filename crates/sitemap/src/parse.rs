//! Tolerant extraction of `<loc>` and `<url>` blocks.
//!
//! Sub-sitemaps run to tens of megabytes and are occasionally truncated or
//! malformed, so this is plain pattern matching rather than an XML parse:
//! whatever well-formed blocks exist are returned, the rest is ignored.

use regex::Regex;
use std::sync::LazyLock;

/// Regex for a `<loc>` value, across line breaks.
#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static LOC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<loc>(.*?)</loc>").unwrap());

/// Regex for one `<url>` block; `<urlset>` does not match.
#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static URL_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<url>(.*?)</url>").unwrap());

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static LASTMOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<lastmod>(.*?)</lastmod>").unwrap());

/// One `<url>` block: its location and optional last-modified stamp, both raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUrlEntry {
    pub loc: String,
    pub last_modified: Option<String>,
}

/// Every non-empty `<loc>` value in document order.
#[must_use]
pub fn extract_locs(xml: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Every `<url>` block that has a `<loc>`. Blocks without one are skipped.
#[must_use]
pub fn extract_url_entries(xml: &str) -> Vec<RawUrlEntry> {
    URL_BLOCK_RE
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .filter_map(|block| {
            let block = block.as_str();
            let loc = first_capture(&LOC_RE, block)?;
            let last_modified = first_capture(&LASTMOD_RE, block);
            Some(RawUrlEntry { loc, last_modified })
        })
        .collect()
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
