//! Full sitemap sync.
//!
//! Walks every sub-sitemap listed by the index, feeds its entries to the
//! upsert engine, and replays failed sitemaps once at the degraded rate.

use std::sync::Arc;
use std::time::Instant;

use slugsync_core::SitemapEntry;
use slugsync_sitemap::SitemapSource;

use crate::config::{BatchOptions, SyncConfig};
use crate::error::ServiceError;
use crate::report::{SyncReport, UpsertReport};
use crate::retry::retry_transient;
use crate::upsert::{UpsertEngine, pace};

pub struct SyncService {
    source: Arc<dyn SitemapSource>,
    engine: UpsertEngine,
    config: SyncConfig,
}

/// Result of processing one sitemap.
enum SitemapOutcome {
    Done { fetched: usize, upsert: UpsertReport },
    FetchFailed { error: ServiceError },
    /// The engine aborted; the entries are kept so the retry pass can reuse them.
    WriteFailed { fetched: usize, entries: Vec<SitemapEntry>, progress: UpsertReport, error: ServiceError },
}

/// Failed sitemaps awaiting the retry pass.
///
/// Entries are cached up to `max_entries` in total; beyond that a failure is
/// queued by URL only and re-fetched on replay.
#[derive(Debug, Default)]
struct RetryQueue {
    items: Vec<(String, Option<Vec<SitemapEntry>>)>,
    cached_entries: usize,
    max_entries: usize,
}

impl RetryQueue {
    fn new(max_entries: usize) -> Self {
        Self { items: Vec::new(), cached_entries: 0, max_entries }
    }

    fn push(&mut self, url: &str, entries: Option<Vec<SitemapEntry>>) {
        let entries = entries.filter(|e| {
            let fits = self.cached_entries.saturating_add(e.len()) <= self.max_entries;
            if !fits {
                tracing::debug!(url, entries = e.len(), "Retry cache full, sitemap will be re-fetched");
            }
            fits
        });
        if let Some(e) = &entries {
            self.cached_entries = self.cached_entries.saturating_add(e.len());
        }
        self.items.push((url.to_owned(), entries));
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn into_items(self) -> Vec<(String, Option<Vec<SitemapEntry>>)> {
        self.items
    }
}

impl SyncService {
    #[must_use]
    pub fn new(source: Arc<dyn SitemapSource>, engine: UpsertEngine, config: SyncConfig) -> Self {
        Self { source, engine, config }
    }

    /// Run a full sync.
    ///
    /// Only the sitemap index is fatal: it is retried per the index policy and
    /// its final error is returned. Every other failure lands in the report.
    pub async fn run(&self) -> Result<SyncReport, ServiceError> {
        let started = Instant::now();
        let urls = retry_transient(&self.config.index_retry, "fetch sitemap index", || {
            self.source.list_sitemaps()
        })
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Sitemap index unavailable, aborting sync"))?;

        let total = urls.len();
        let mut report = SyncReport { sitemaps_total: total, ..SyncReport::default() };
        let mut queue = RetryQueue::new(self.config.retry_cache_max_entries);

        for (index, url) in urls.iter().enumerate() {
            if index > 0 {
                pace(self.config.sitemap_delay).await;
            }
            match self.process(url, None, self.config.batch).await {
                SitemapOutcome::Done { fetched, upsert } => {
                    report.sitemaps_ok = report.sitemaps_ok.saturating_add(1);
                    report.entries_seen = report.entries_seen.saturating_add(fetched as u64);
                    report.absorb(upsert);
                },
                SitemapOutcome::FetchFailed { error } => {
                    tracing::warn!(url = %url, error = %error, "Sitemap fetch failed, queued for retry");
                    queue.push(url, None);
                },
                SitemapOutcome::WriteFailed { entries, progress, error, .. } => {
                    // the retry pass rewrites every entry, so it owns this sitemap's counts
                    tracing::warn!(
                        url = %url,
                        written = progress.written,
                        error = %error,
                        "Sitemap write aborted, queued for retry"
                    );
                    queue.push(url, Some(entries));
                },
            }
            tracing::info!(
                sitemap = index.saturating_add(1),
                total,
                upserted = report.upserted,
                failed = report.failed,
                queued = queue.len(),
                "Sitemap processed"
            );
        }

        if !queue.is_empty() {
            tracing::info!(sitemaps = queue.len(), "Starting degraded retry pass");
            let retried = self.replay(queue).await;
            merge_retry(&mut report, retried);
        }

        report.elapsed_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            sitemaps = report.sitemaps_total,
            upserted = report.upserted,
            failed = report.failed,
            unrecovered = report.unrecovered.len(),
            elapsed_secs = report.elapsed_secs,
            "Sync finished"
        );
        Ok(report)
    }

    /// Process an explicit list of sitemaps at the degraded rate, each fetched once.
    pub async fn retry_sitemaps(&self, urls: &[String]) -> SyncReport {
        let started = Instant::now();
        let mut queue = RetryQueue::new(0);
        for url in urls {
            queue.push(url, None);
        }
        let mut report = self.replay(queue).await;
        report.sitemaps_total = urls.len();
        report.elapsed_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            sitemaps = report.sitemaps_total,
            recovered = report.sitemaps_recovered,
            upserted = report.upserted,
            failed = report.failed,
            "Retry finished"
        );
        report
    }

    /// Single degraded pass over queued sitemaps. Never loops.
    ///
    /// Counts of a sitemap come from the pass that finished it, so an aborted
    /// main-pass write contributes nothing beyond what this pass reports.
    async fn replay(&self, queue: RetryQueue) -> SyncReport {
        let mut report = SyncReport::default();
        for (index, (url, cached)) in queue.into_items().into_iter().enumerate() {
            if index > 0 {
                pace(self.config.sitemap_delay).await;
            }
            report.sitemaps_retried = report.sitemaps_retried.saturating_add(1);
            match self.process(&url, cached, self.config.retry_batch).await {
                SitemapOutcome::Done { fetched, upsert } => {
                    report.sitemaps_recovered = report.sitemaps_recovered.saturating_add(1);
                    report.entries_seen = report.entries_seen.saturating_add(fetched as u64);
                    report.absorb(upsert);
                    tracing::info!(url = %url, written = upsert.written, "Sitemap recovered");
                },
                SitemapOutcome::FetchFailed { error } => {
                    tracing::warn!(url = %url, error = %error, "Sitemap retry fetch failed");
                    report.unrecovered.push(url);
                },
                SitemapOutcome::WriteFailed { fetched, progress, error, .. } => {
                    tracing::warn!(url = %url, error = %error, "Sitemap retry write aborted");
                    report.entries_seen = report.entries_seen.saturating_add(fetched as u64);
                    report.absorb(progress);
                    report.unrecovered.push(url);
                },
            }
        }
        report
    }

    async fn process(
        &self,
        url: &str,
        cached: Option<Vec<SitemapEntry>>,
        options: BatchOptions,
    ) -> SitemapOutcome {
        let entries = match cached {
            Some(entries) => entries,
            None => match self.source.fetch_sitemap(url).await {
                Ok(entries) => entries,
                Err(e) => return SitemapOutcome::FetchFailed { error: e.into() },
            },
        };
        let fetched = entries.len();
        match self.engine.upsert_entries(&entries, options).await {
            Ok(upsert) => SitemapOutcome::Done { fetched, upsert },
            Err(error) => {
                let progress = match &error {
                    ServiceError::WriteAborted { progress, .. } => *progress,
                    _ => UpsertReport::default(),
                };
                SitemapOutcome::WriteFailed { fetched, entries, progress, error }
            },
        }
    }
}

fn merge_retry(report: &mut SyncReport, retried: SyncReport) {
    report.sitemaps_retried = retried.sitemaps_retried;
    report.sitemaps_recovered = retried.sitemaps_recovered;
    report.unrecovered = retried.unrecovered;
    report.entries_seen = report.entries_seen.saturating_add(retried.entries_seen);
    report.upserted = report.upserted.saturating_add(retried.upserted);
    report.failed = report.failed.saturating_add(retried.failed);
    report.deduplicated = report.deduplicated.saturating_add(retried.deduplicated);
}
