//! Batch upsert engine.
//!
//! Splits rows into sub-batches, keeps the last occurrence of each slug, and
//! writes every sub-batch with one bulk request. When the bulk request fails
//! the sub-batch is replayed row by row so a single poison row cannot block
//! its neighbours. The pacing delay follows each sub-batch whose bulk request
//! succeeded, except the last one.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use slugsync_core::{SearchKeyUpdate, SitemapEntry, SlugRecord};
use slugsync_storage::{SlugStore, StorageError};

use crate::config::BatchOptions;
use crate::error::ServiceError;
use crate::report::UpsertReport;
use crate::retry::{RetryPolicy, retry_transient};

/// A payload the engine knows how to send to the store.
#[async_trait]
pub trait WriteRow: Send + Sync + Sized {
    /// Natural key used for deduplication and logging.
    fn key(&self) -> &str;

    /// Write `rows` in one request; returns the number of rows acknowledged.
    async fn write(store: &dyn SlugStore, rows: &[Self]) -> Result<u64, StorageError>;
}

#[async_trait]
impl WriteRow for SlugRecord {
    fn key(&self) -> &str {
        &self.slug
    }

    async fn write(store: &dyn SlugStore, rows: &[Self]) -> Result<u64, StorageError> {
        store.upsert_slugs(rows).await
    }
}

#[async_trait]
impl WriteRow for SearchKeyUpdate {
    fn key(&self) -> &str {
        &self.slug
    }

    async fn write(store: &dyn SlugStore, rows: &[Self]) -> Result<u64, StorageError> {
        store.update_search_keys(rows).await
    }
}

#[derive(Clone)]
pub struct UpsertEngine {
    store: Arc<dyn SlugStore>,
    write_retry: RetryPolicy,
}

impl std::fmt::Debug for UpsertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpsertEngine").field("write_retry", &self.write_retry).finish_non_exhaustive()
    }
}

impl UpsertEngine {
    #[must_use]
    pub fn new(store: Arc<dyn SlugStore>, write_retry: RetryPolicy) -> Self {
        Self { store, write_retry }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SlugStore> {
        &self.store
    }

    /// Sanitize, deduplicate and upsert sitemap entries.
    ///
    /// Entries whose slug is empty after sanitization are counted as failed and
    /// never written. Fails only with [`ServiceError::WriteAborted`].
    pub async fn upsert_entries(
        &self,
        entries: &[SitemapEntry],
        options: BatchOptions,
    ) -> Result<UpsertReport, ServiceError> {
        let mut report = UpsertReport::default();
        let chunk_count = entries.len().div_ceil(options.effective_size());

        for (index, chunk) in entries.chunks(options.effective_size()).enumerate() {
            let now = Utc::now();
            let mut records = Vec::with_capacity(chunk.len());
            for entry in chunk {
                match SlugRecord::from_entry(entry, now) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping sitemap entry");
                        report.failed = report.failed.saturating_add(1);
                    },
                }
            }

            let outcome = self.write_sub_batch(records, report).await?;
            report.merge(outcome.report);

            if outcome.bulk_written && index.saturating_add(1) < chunk_count {
                pace(options.delay).await;
            }
        }
        Ok(report)
    }

    /// Write search-key repairs; same sub-batch and fallback discipline as
    /// [`Self::upsert_entries`].
    pub async fn write_repairs(
        &self,
        updates: &[SearchKeyUpdate],
        options: BatchOptions,
    ) -> Result<UpsertReport, ServiceError> {
        let mut report = UpsertReport::default();
        let chunk_count = updates.len().div_ceil(options.effective_size());

        for (index, chunk) in updates.chunks(options.effective_size()).enumerate() {
            let outcome = self.write_sub_batch(chunk.to_vec(), report).await?;
            report.merge(outcome.report);

            if outcome.bulk_written && index.saturating_add(1) < chunk_count {
                pace(options.delay).await;
            }
        }
        Ok(report)
    }

    /// `progress` is only used to fill [`ServiceError::WriteAborted`].
    ///
    /// After a transient bulk failure the retry budget is already spent, so
    /// each fallback row gets one attempt, and a first row that also fails
    /// transiently means the store is unreachable.
    async fn write_sub_batch<R: WriteRow>(
        &self,
        rows: Vec<R>,
        progress: UpsertReport,
    ) -> Result<SubBatchOutcome, ServiceError> {
        let (rows, deduplicated) = dedup_keep_last(rows);
        let mut report = UpsertReport { deduplicated, ..UpsertReport::default() };
        if rows.is_empty() {
            return Ok(SubBatchOutcome { report, bulk_written: false });
        }

        let store = self.store.as_ref();
        let bulk_err =
            match retry_transient(&self.write_retry, "bulk write", || R::write(store, &rows)).await {
                Ok(written) => {
                    report.written = written;
                    return Ok(SubBatchOutcome { report, bulk_written: true });
                },
                Err(e) => e,
            };

        tracing::warn!(
            rows = rows.len(),
            error = %bulk_err,
            "Bulk write failed, falling back to per-row writes"
        );

        let row_retry = if bulk_err.is_transient() { RetryPolicy::none() } else { self.write_retry };
        for (position, row) in rows.iter().enumerate() {
            let single = std::slice::from_ref(row);
            match retry_transient(&row_retry, "row write", || R::write(store, single)).await {
                Ok(written) => report.written = report.written.saturating_add(written),
                Err(e) => {
                    tracing::warn!(slug = row.key(), error = %e, "Row write failed");
                    report.failed = report.failed.saturating_add(1);
                    if position == 0 && bulk_err.is_transient() && e.is_transient() {
                        let mut aborted = progress;
                        aborted.merge(report);
                        tracing::error!(
                            written = aborted.written,
                            failed = aborted.failed,
                            "Bulk and single-row writes both failed, store looks unreachable"
                        );
                        return Err(ServiceError::WriteAborted { progress: aborted, source: e });
                    }
                },
            }
        }
        Ok(SubBatchOutcome { report, bulk_written: false })
    }
}

struct SubBatchOutcome {
    report: UpsertReport,
    /// The single bulk request succeeded; only then is the pacing delay due.
    bulk_written: bool,
}

/// Keep the last occurrence of each key, preserving relative order.
fn dedup_keep_last<R: WriteRow>(rows: Vec<R>) -> (Vec<R>, u64) {
    let total = rows.len();
    let mut seen = HashSet::with_capacity(total);
    let mut kept: Vec<R> = Vec::with_capacity(total);
    for row in rows.into_iter().rev() {
        if seen.insert(row.key().to_owned()) {
            kept.push(row);
        }
    }
    kept.reverse();
    let dropped = total.saturating_sub(kept.len()) as u64;
    (kept, dropped)
}

pub(crate) async fn pace(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
