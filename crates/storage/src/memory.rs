//! In-memory slug store for dry runs and tests.
//!
//! Mirrors the PostgreSQL backend's observable behavior: byte-ordered cursor
//! pages, atomic bulk writes, and rejection of text containing NUL bytes.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slugsync_core::{SearchKeyUpdate, SlugRecord, SlugStats, StoredSlug};

use crate::error::StorageError;
use crate::traits::SlugStore;

#[derive(Debug, Clone)]
struct MemoryRow {
    slug: StoredSlug,
    updated_at: DateTime<Utc>,
}

/// `BTreeMap<String, _>` orders keys by bytes, matching `COLLATE "C"`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, MemoryRow>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows verbatim, bypassing derivation (used to stage drifted keys).
    pub fn insert_raw(&self, rows: impl IntoIterator<Item = StoredSlug>) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut map = self.lock()?;
        for slug in rows {
            map.insert(slug.slug.clone(), MemoryRow { slug, updated_at: now });
        }
        Ok(())
    }

    /// Snapshot of every row in key order.
    pub fn rows(&self) -> Result<Vec<StoredSlug>, StorageError> {
        Ok(self.lock()?.values().map(|r| r.slug.clone()).collect())
    }

    /// Last write time of one row.
    pub fn updated_at(&self, slug: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(self.lock()?.get(slug).map(|r| r.updated_at))
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, MemoryRow>>, StorageError> {
        self.rows.lock().map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }
}

fn reject_nul(field: &str, value: Option<&str>) -> Result<(), StorageError> {
    match value {
        Some(v) if v.contains('\0') => {
            Err(StorageError::Rejected(format!("invalid byte sequence (0x00) in {field}")))
        },
        _ => Ok(()),
    }
}

fn validate(record: &SlugRecord) -> Result<(), StorageError> {
    reject_nul("slug", Some(&record.slug))?;
    reject_nul("title", record.title.as_deref())?;
    reject_nul("search_key", Some(&record.search_key))?;
    reject_nul("last_modified", record.last_modified.as_deref())
}

#[async_trait]
impl SlugStore for MemoryStore {
    async fn upsert_slugs(&self, records: &[SlugRecord]) -> Result<u64, StorageError> {
        for record in records {
            validate(record)?;
        }
        let mut map = self.lock()?;
        for record in records {
            map.insert(
                record.slug.clone(),
                MemoryRow {
                    slug: StoredSlug {
                        slug: record.slug.clone(),
                        title: record.title.clone(),
                        search_key: Some(record.search_key.clone()),
                        last_modified: record.last_modified.clone(),
                    },
                    updated_at: record.updated_at,
                },
            );
        }
        Ok(records.len() as u64)
    }

    async fn update_search_keys(&self, updates: &[SearchKeyUpdate]) -> Result<u64, StorageError> {
        for update in updates {
            reject_nul("search_key", Some(&update.search_key))?;
        }
        let now = Utc::now();
        let mut map = self.lock()?;
        let mut touched: u64 = 0;
        for update in updates {
            if let Some(row) = map.get_mut(&update.slug) {
                row.slug.search_key = Some(update.search_key.clone());
                row.updated_at = now;
                touched = touched.saturating_add(1);
            }
        }
        Ok(touched)
    }

    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredSlug>, StorageError> {
        use std::ops::Bound;

        let map = self.lock()?;
        let lower = match after {
            Some(cursor) => Bound::Excluded(cursor.to_owned()),
            None => Bound::Unbounded,
        };
        Ok(map
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, row)| row.slug.clone())
            .collect())
    }

    async fn find_slugs(&self, slugs: &[String]) -> Result<Vec<StoredSlug>, StorageError> {
        let map = self.lock()?;
        Ok(slugs.iter().filter_map(|s| map.get(s)).map(|row| row.slug.clone()).collect())
    }

    async fn search_by_key(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<StoredSlug>, StorageError> {
        let map = self.lock()?;
        let mut hits: Vec<StoredSlug> = map
            .values()
            .filter(|row| row.slug.search_key.as_deref().is_some_and(|k| k.contains(key)))
            .map(|row| row.slug.clone())
            .collect();
        hits.sort_by(|a, b| {
            let ka = a.search_key.as_deref().unwrap_or_default();
            let kb = b.search_key.as_deref().unwrap_or_default();
            ka.len().cmp(&kb.len()).then_with(|| ka.cmp(kb))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn stats(&self) -> Result<SlugStats, StorageError> {
        let map = self.lock()?;
        let missing = map.values().filter(|row| row.slug.search_key.is_none()).count();
        Ok(SlugStats { total: map.len() as u64, missing_search_key: missing as u64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slug: &str, title: &str) -> SlugRecord {
        SlugRecord {
            slug: slug.to_owned(),
            title: Some(title.to_owned()),
            search_key: slugsync_core::normalize_text(title),
            last_modified: None,
            updated_at: Utc::now(),
        }
    }

    fn raw(slug: &str, key: Option<&str>) -> StoredSlug {
        StoredSlug {
            slug: slug.to_owned(),
            title: None,
            search_key: key.map(str::to_owned),
            last_modified: None,
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_key() {
        let store = MemoryStore::new();
        store.upsert_slugs(&[record("A", "Old")]).await.unwrap();
        store.upsert_slugs(&[record("A", "New Title")]).await.unwrap();
        let rows = store.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title.as_deref(), Some("New Title"));
        assert_eq!(rows[0].search_key.as_deref(), Some("newtitle"));
    }

    #[tokio::test]
    async fn bulk_write_is_atomic_on_rejection() {
        let store = MemoryStore::new();
        let err = store.upsert_slugs(&[record("Good", "Good"), record("Bad\0", "Bad")]).await;
        assert!(matches!(err, Err(StorageError::Rejected(_))));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn pages_follow_byte_order_cursor() {
        let store = MemoryStore::new();
        store.insert_raw(["b", "a", "C", "é", "c"].map(|s| raw(s, None))).unwrap();

        let first = store.fetch_page(None, 2).await.unwrap();
        assert_eq!(first.iter().map(|r| r.slug.as_str()).collect::<Vec<_>>(), ["C", "a"]);

        let second = store.fetch_page(Some("a"), 10).await.unwrap();
        assert_eq!(second.iter().map(|r| r.slug.as_str()).collect::<Vec<_>>(), ["b", "c", "é"]);

        assert!(store.fetch_page(Some("é"), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn key_updates_skip_missing_rows() {
        let store = MemoryStore::new();
        store.insert_raw([raw("A", None)]).unwrap();
        let touched = store
            .update_search_keys(&[
                SearchKeyUpdate { slug: "A".into(), search_key: "a".into() },
                SearchKeyUpdate { slug: "Gone".into(), search_key: "gone".into() },
            ])
            .await
            .unwrap();
        assert_eq!(touched, 1);
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.stats().await.unwrap().missing_search_key, 0);
    }

    #[tokio::test]
    async fn search_prefers_shorter_keys() {
        let store = MemoryStore::new();
        store
            .insert_raw([
                raw("Clinton_Foundation", Some("clintonfoundation")),
                raw("Bill_Clinton", Some("billclinton")),
                raw("Clinton", Some("clinton")),
                raw("Unkeyed", None),
            ])
            .unwrap();
        let hits = store.search_by_key("clinton", 2).await.unwrap();
        assert_eq!(hits.iter().map(|r| r.slug.as_str()).collect::<Vec<_>>(), ["Clinton", "Bill_Clinton"]);
    }
}
