use std::collections::HashMap;
use std::sync::Arc;

use slugsync_core::{
    MAX_CHECK_SLUGS, MAX_SEARCH_LIMIT, SlugCheck, SlugError, SlugStats, StoredSlug,
    sanitize_lookup_slug, search_query_key,
};
use slugsync_storage::SlugStore;

use crate::ServiceError;

/// Read-only queries over the slug table.
pub struct LookupService {
    store: Arc<dyn SlugStore>,
}

impl LookupService {
    #[must_use]
    pub fn new(store: Arc<dyn SlugStore>) -> Self {
        Self { store }
    }

    /// Existence check for up to [`MAX_CHECK_SLUGS`] slugs, answered in input order.
    pub async fn check(&self, slugs: &[String]) -> Result<Vec<SlugCheck>, ServiceError> {
        if slugs.len() > MAX_CHECK_SLUGS {
            return Err(SlugError::TooManySlugs { count: slugs.len(), max: MAX_CHECK_SLUGS }.into());
        }
        let sanitized: Vec<String> = slugs.iter().map(|s| sanitize_lookup_slug(s)).collect();
        let mut lookup: Vec<String> = sanitized.iter().filter(|s| !s.is_empty()).cloned().collect();
        lookup.sort_unstable();
        lookup.dedup();

        let found: HashMap<String, StoredSlug> = if lookup.is_empty() {
            HashMap::new()
        } else {
            self.store.find_slugs(&lookup).await?.into_iter().map(|r| (r.slug.clone(), r)).collect()
        };

        Ok(sanitized
            .into_iter()
            .map(|slug| match found.get(&slug) {
                Some(row) => SlugCheck {
                    exists: true,
                    title: row.title.clone(),
                    last_modified: row.last_modified.clone(),
                    slug,
                },
                None => SlugCheck { slug, exists: false, title: None, last_modified: None },
            })
            .collect())
    }

    /// Rows whose key contains the normalized query, shortest key first.
    /// `limit` is clamped to `1..=MAX_SEARCH_LIMIT`.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<StoredSlug>, ServiceError> {
        let key = search_query_key(query)?;
        Ok(self.store.search_by_key(&key, limit.clamp(1, MAX_SEARCH_LIMIT)).await?)
    }

    pub async fn stats(&self) -> Result<SlugStats, ServiceError> {
        Ok(self.store.stats().await?)
    }
}
