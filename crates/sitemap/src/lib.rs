//! Sitemap source for slugsync
//!
//! Fetches the sitemap index and each sub-sitemap over HTTP and extracts
//! entries without a validating XML parse. Retry policy is left to callers.

mod client;
mod error;
#[cfg(test)]
mod http_tests;
mod parse;

pub use client::{SitemapClient, SitemapSource, entries_from_xml};
pub use error::FetchError;
pub use parse::{RawUrlEntry, extract_locs, extract_url_entries};
