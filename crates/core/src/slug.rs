use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    MAX_LOOKUP_SLUG_LEN, SlugError, decode_slug, normalize_text, search_key_for,
};

/// One `<url>` block of a sub-sitemap after slug decoding.
///
/// Ephemeral: never persisted directly, always sanitized into a [`SlugRecord`] first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub slug: String,
    pub title: Option<String>,
    pub last_modified: Option<String>,
}

impl SitemapEntry {
    #[must_use]
    pub fn new(slug: impl Into<String>, title: Option<String>, last_modified: Option<String>) -> Self {
        Self { slug: slug.into(), title, last_modified }
    }

    /// Build an entry from the raw path segment that follows the page URL prefix.
    #[must_use]
    pub fn from_raw_segment(raw_segment: &str, last_modified: Option<String>) -> Self {
        let decoded = decode_slug(raw_segment);
        Self { slug: decoded.slug, title: Some(decoded.title), last_modified }
    }
}

/// Write payload for one slug row. `search_key` is always derived, never supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugRecord {
    pub slug: String,
    pub title: Option<String>,
    pub search_key: String,
    pub last_modified: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SlugRecord {
    /// Sanitize an entry into a write payload.
    ///
    /// # Errors
    /// [`SlugError::EmptySlug`] when the slug is empty once NUL bytes and
    /// surrounding whitespace are removed.
    pub fn from_entry(entry: &SitemapEntry, updated_at: DateTime<Utc>) -> Result<Self, SlugError> {
        let slug = sanitize_field(&entry.slug);
        if slug.is_empty() {
            return Err(SlugError::EmptySlug { raw: entry.slug.clone() });
        }
        let title = entry.title.as_deref().map(sanitize_field).filter(|t| !t.is_empty());
        let search_key = search_key_for(title.as_deref(), &slug);
        Ok(Self {
            slug,
            title,
            search_key,
            last_modified: entry.last_modified.as_deref().map(sanitize_field).filter(|m| !m.is_empty()),
            updated_at,
        })
    }
}

/// A row as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSlug {
    pub slug: String,
    pub title: Option<String>,
    pub search_key: Option<String>,
    pub last_modified: Option<String>,
}

impl StoredSlug {
    /// Key this row must carry: `normalize_text(title or slug)`.
    #[must_use]
    pub fn expected_search_key(&self) -> String {
        search_key_for(self.title.as_deref(), &self.slug)
    }

    /// Repair needed to restore the search-key invariant, if any.
    #[must_use]
    pub fn search_key_repair(&self) -> Option<SearchKeyUpdate> {
        let expected = self.expected_search_key();
        match self.search_key.as_deref() {
            Some(current) if current == expected => None,
            _ => Some(SearchKeyUpdate { slug: self.slug.clone(), search_key: expected }),
        }
    }
}

/// Targeted rewrite of a row's derived key; leaves every other column alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchKeyUpdate {
    pub slug: String,
    pub search_key: String,
}

/// Existence-check answer for one requested slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugCheck {
    pub slug: String,
    pub exists: bool,
    pub title: Option<String>,
    pub last_modified: Option<String>,
}

/// Row counts used to judge backfill progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlugStats {
    pub total: u64,
    pub missing_search_key: u64,
}

/// Strip NUL bytes and surrounding whitespace.
#[must_use]
pub fn sanitize_field(value: &str) -> String {
    if value.contains('\0') {
        value.replace('\0', "").trim().to_owned()
    } else {
        value.trim().to_owned()
    }
}

/// Sanitize a user-supplied slug for lookups: [`sanitize_field`] then cap the length.
#[must_use]
pub fn sanitize_lookup_slug(value: &str) -> String {
    sanitize_field(value).chars().take(MAX_LOOKUP_SLUG_LEN).collect()
}

/// Normalize a free-text query into a search key.
///
/// # Errors
/// [`SlugError::EmptyQuery`] when nothing is left after normalization.
pub fn search_query_key(query: &str) -> Result<String, SlugError> {
    let key = normalize_text(sanitize_field(query).as_str());
    if key.is_empty() {
        return Err(SlugError::EmptyQuery);
    }
    Ok(key)
}
