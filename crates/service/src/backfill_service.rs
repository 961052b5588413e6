//! Cursor backfill of derived search keys.
//!
//! Pages through the table by slug (byte order, strictly after the last seen
//! slug) and rewrites `search_key` on rows where it is missing or stale. Only an
//! empty page ends a complete run.

use std::time::Instant;

use slugsync_core::SearchKeyUpdate;

use crate::config::BackfillConfig;
use crate::report::{BackfillOutcome, BackfillReport};
use crate::retry::retry_transient;
use crate::upsert::{UpsertEngine, pace};

pub struct BackfillService {
    engine: UpsertEngine,
    config: BackfillConfig,
}

impl BackfillService {
    #[must_use]
    pub fn new(engine: UpsertEngine, config: BackfillConfig) -> Self {
        Self { engine, config }
    }

    /// Walk the whole table once.
    ///
    /// Never fails: a page read that keeps failing, or a store that refuses a
    /// whole repair sub-batch, ends the run with [`BackfillOutcome::Truncated`].
    pub async fn run(&self) -> BackfillReport {
        let started = Instant::now();
        let store = self.engine.store().as_ref();
        let page_size = self.config.page_size.max(1);
        let mut cursor: Option<String> = None;
        let mut processed: u64 = 0;
        let mut repaired: u64 = 0;
        let mut failed: u64 = 0;
        let mut pages: u64 = 0;

        let outcome = loop {
            let fetched = retry_transient(&self.config.read_retry, "fetch backfill page", || {
                store.fetch_page(cursor.as_deref(), page_size)
            })
            .await;
            let page = match fetched {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        after = ?cursor,
                        error = %e,
                        "Backfill stopped early: page fetch failed after retries"
                    );
                    break BackfillOutcome::Truncated { after: cursor };
                },
            };
            pages = pages.saturating_add(1);

            let Some(last) = page.last() else {
                break BackfillOutcome::Completed;
            };
            let page_start = cursor.replace(last.slug.clone());
            processed = processed.saturating_add(page.len() as u64);

            let repairs: Vec<SearchKeyUpdate> =
                page.iter().filter_map(|row| row.search_key_repair()).collect();
            if !repairs.is_empty() {
                match self.engine.write_repairs(&repairs, self.config.repair_batch()).await {
                    Ok(report) => {
                        repaired = repaired.saturating_add(report.written);
                        failed = failed.saturating_add(report.failed);
                    },
                    Err(e) => {
                        tracing::warn!(
                            after = ?page_start,
                            error = %e,
                            "Backfill stopped early: store refused repairs"
                        );
                        break BackfillOutcome::Truncated { after: page_start };
                    },
                }
            }

            let elapsed = started.elapsed().as_secs_f64();
            tracing::info!(
                page = pages,
                rows = page.len(),
                repairs = repairs.len(),
                processed,
                repaired,
                rows_per_sec = if elapsed > 0.0 { processed as f64 / elapsed } else { 0.0 },
                "Backfill page done"
            );

            pace(self.config.page_delay).await;
            if !repairs.is_empty() {
                pace(self.config.repair_delay).await;
            }
        };

        let report = BackfillReport {
            processed,
            repaired,
            failed,
            pages,
            outcome,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        if !report.is_truncated() {
            tracing::info!(
                processed,
                repaired,
                failed,
                elapsed_secs = report.elapsed_secs,
                "Backfill complete"
            );
        }
        report
    }
}
