//! Storage backend trait abstraction.

use async_trait::async_trait;
use slugsync_core::{SearchKeyUpdate, SlugRecord, SlugStats, StoredSlug};

use crate::error::StorageError;

/// Key-based access to the slug table. Every write is keyed on `slug` and is
/// last-writer-wins, so concurrent sync and backfill runs need no lock.
#[async_trait]
pub trait SlugStore: Send + Sync {
    /// Insert or overwrite every non-key column of `records`, atomically per call.
    /// Returns the number of rows written.
    ///
    /// Callers must not pass the same slug twice in one call.
    async fn upsert_slugs(&self, records: &[SlugRecord]) -> Result<u64, StorageError>;

    /// Rewrite `search_key` (and `updated_at`) of existing rows only.
    /// Slugs that no longer exist are ignored. Returns the number of rows touched.
    async fn update_search_keys(&self, updates: &[SearchKeyUpdate]) -> Result<u64, StorageError>;

    /// Up to `limit` rows with `slug > after` in byte order; `None` starts at the beginning.
    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredSlug>, StorageError>;

    /// Rows for exactly these slugs; missing slugs are simply absent.
    async fn find_slugs(&self, slugs: &[String]) -> Result<Vec<StoredSlug>, StorageError>;

    /// Rows whose `search_key` contains `key`, shortest key first.
    async fn search_by_key(&self, key: &str, limit: usize)
        -> Result<Vec<StoredSlug>, StorageError>;

    /// Total rows and rows still lacking a search key.
    async fn stats(&self) -> Result<SlugStats, StorageError>;
}
