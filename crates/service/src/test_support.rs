//! Scriptable fakes for the sitemap source and the slug store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use slugsync_core::{SearchKeyUpdate, SitemapEntry, SlugRecord, SlugStats, StoredSlug};
use slugsync_sitemap::{FetchError, SitemapSource};
use slugsync_storage::{MemoryStore, SlugStore, StorageError};

/// In-memory sitemap tree with per-URL scripted failures.
#[derive(Default)]
pub(crate) struct FakeSource {
    urls: Vec<String>,
    sitemaps: HashMap<String, Vec<SitemapEntry>>,
    /// Remaining failures per URL; `u32::MAX` means always failing.
    failures: Mutex<HashMap<String, u32>>,
    index_failures: AtomicU32,
    calls: Mutex<HashMap<String, u32>>,
    pub index_calls: AtomicU32,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sitemap(mut self, url: &str, entries: Vec<SitemapEntry>) -> Self {
        self.urls.push(url.to_owned());
        self.sitemaps.insert(url.to_owned(), entries);
        self
    }

    pub fn failing(self, url: &str, times: u32) -> Self {
        self.failures.lock().unwrap().insert(url.to_owned(), times);
        self
    }

    pub fn index_failing(self, times: u32) -> Self {
        self.index_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl SitemapSource for FakeSource {
    async fn list_sitemaps(&self) -> Result<Vec<String>, FetchError> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.index_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.index_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(FetchError::Status { url: "index".into(), code: 503 });
        }
        Ok(self.urls.clone())
    }

    async fn fetch_sitemap(&self, url: &str) -> Result<Vec<SitemapEntry>, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_owned()).or_default() += 1;
        let fail = match self.failures.lock().unwrap().get_mut(url) {
            Some(remaining) if *remaining > 0 => {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                true
            },
            _ => false,
        };
        if fail {
            return Err(FetchError::Status { url: url.to_owned(), code: 503 });
        }
        self.sitemaps
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status { url: url.to_owned(), code: 404 })
    }
}

/// [`MemoryStore`] wrapper that can reject poison slugs, go down, fail chosen writes, or fail page reads.
#[derive(Default)]
pub(crate) struct FlakyStore {
    pub inner: MemoryStore,
    poison: Mutex<HashSet<String>>,
    down: AtomicBool,
    /// Page fetches with a 0-based index at or above this value fail.
    fail_pages_from: Mutex<Option<usize>>,
    /// 0-based write call indices that fail as unavailable.
    failing_writes: Mutex<HashSet<usize>>,
    pub write_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poison(&self, slug: &str) {
        self.poison.lock().unwrap().insert(slug.to_owned());
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn fail_pages_from(&self, index: usize) {
        *self.fail_pages_from.lock().unwrap() = Some(index);
    }

    pub fn fail_write_calls(&self, calls: impl IntoIterator<Item = usize>) {
        self.failing_writes.lock().unwrap().extend(calls);
    }

    fn check_write<'a>(&self, mut slugs: impl Iterator<Item = &'a str>) -> Result<(), StorageError> {
        let index = self.write_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.failing_writes.lock().unwrap().contains(&index);
        if scripted || self.down.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("connection refused".into()));
        }
        let poison = self.poison.lock().unwrap();
        if slugs.any(|s| poison.contains(s)) {
            return Err(StorageError::Rejected("poison row".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SlugStore for FlakyStore {
    async fn upsert_slugs(&self, records: &[SlugRecord]) -> Result<u64, StorageError> {
        self.check_write(records.iter().map(|r| r.slug.as_str()))?;
        self.inner.upsert_slugs(records).await
    }

    async fn update_search_keys(&self, updates: &[SearchKeyUpdate]) -> Result<u64, StorageError> {
        self.check_write(updates.iter().map(|u| u.slug.as_str()))?;
        self.inner.update_search_keys(updates).await
    }

    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredSlug>, StorageError> {
        let index = self.page_calls.fetch_add(1, Ordering::SeqCst);
        let fail_from = *self.fail_pages_from.lock().unwrap();
        if fail_from.is_some_and(|from| index >= from) {
            return Err(StorageError::Unavailable("read timed out".into()));
        }
        self.inner.fetch_page(after, limit).await
    }

    async fn find_slugs(&self, slugs: &[String]) -> Result<Vec<StoredSlug>, StorageError> {
        self.inner.find_slugs(slugs).await
    }

    async fn search_by_key(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<StoredSlug>, StorageError> {
        self.inner.search_by_key(key, limit).await
    }

    async fn stats(&self) -> Result<SlugStats, StorageError> {
        self.inner.stats().await
    }
}

pub(crate) fn entry(slug: &str) -> SitemapEntry {
    SitemapEntry::new(slug, Some(slug.replace('_', " ")), None)
}

pub(crate) fn entries(prefix: &str, count: usize) -> Vec<SitemapEntry> {
    (0..count).map(|i| entry(&format!("{prefix}_{i}"))).collect()
}
