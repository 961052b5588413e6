//! Pacing and sizing knobs for the orchestrators.
//!
//! Defaults come from `slugsync_core` constants; `from_env` lets operators
//! override them without a rebuild.

use std::time::Duration;

use slugsync_core::{
    BACKFILL_PAGE_DELAY_MS, BACKFILL_PAGE_SIZE, BACKFILL_REPAIR_DELAY_MS,
    BACKFILL_WRITE_BATCH_SIZE, DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE,
    DEFAULT_SITEMAP_DELAY_MS, RETRY_BATCH_DELAY_MS, RETRY_BATCH_SIZE, RETRY_CACHE_MAX_ENTRIES,
    env_millis_with_default, env_parse_with_default,
};

use crate::retry::RetryPolicy;

/// Sub-batch size plus the pause taken after each successful sub-batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub batch_size: usize,
    pub delay: Duration,
}

impl BatchOptions {
    #[must_use]
    pub const fn new(batch_size: usize, delay: Duration) -> Self {
        Self { batch_size, delay }
    }

    /// Main-pass rate.
    #[must_use]
    pub const fn main_pass() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, Duration::from_millis(DEFAULT_BATCH_DELAY_MS))
    }

    /// Degraded rate used by the retry pass.
    #[must_use]
    pub const fn degraded() -> Self {
        Self::new(RETRY_BATCH_SIZE, Duration::from_millis(RETRY_BATCH_DELAY_MS))
    }

    /// Zero-sized batches would never make progress.
    pub(crate) fn effective_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub batch: BatchOptions,
    pub retry_batch: BatchOptions,
    /// Pause between two sub-sitemaps.
    pub sitemap_delay: Duration,
    /// Cap on entries held in memory for the retry pass.
    pub retry_cache_max_entries: usize,
    /// Policy for the sitemap index request.
    pub index_retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch: BatchOptions::main_pass(),
            retry_batch: BatchOptions::degraded(),
            sitemap_delay: Duration::from_millis(DEFAULT_SITEMAP_DELAY_MS),
            retry_cache_max_entries: RETRY_CACHE_MAX_ENTRIES,
            index_retry: RetryPolicy::reads(),
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `SLUGSYNC_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            batch: BatchOptions::new(
                env_parse_with_default("SLUGSYNC_BATCH_SIZE", DEFAULT_BATCH_SIZE),
                env_millis_with_default("SLUGSYNC_BATCH_DELAY_MS", DEFAULT_BATCH_DELAY_MS),
            ),
            retry_batch: BatchOptions::new(
                env_parse_with_default("SLUGSYNC_RETRY_BATCH_SIZE", RETRY_BATCH_SIZE),
                env_millis_with_default("SLUGSYNC_RETRY_BATCH_DELAY_MS", RETRY_BATCH_DELAY_MS),
            ),
            sitemap_delay: env_millis_with_default(
                "SLUGSYNC_SITEMAP_DELAY_MS",
                DEFAULT_SITEMAP_DELAY_MS,
            ),
            retry_cache_max_entries: env_parse_with_default(
                "SLUGSYNC_RETRY_CACHE_MAX_ENTRIES",
                RETRY_CACHE_MAX_ENTRIES,
            ),
            index_retry: RetryPolicy::reads(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    pub page_size: usize,
    /// Repairs flushed per sub-batch; kept below `page_size`.
    pub write_batch_size: usize,
    /// Pause after every fetched page.
    pub page_delay: Duration,
    /// Extra pause after a page that needed repairs.
    pub repair_delay: Duration,
    pub read_retry: RetryPolicy,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            page_size: BACKFILL_PAGE_SIZE,
            write_batch_size: BACKFILL_WRITE_BATCH_SIZE,
            page_delay: Duration::from_millis(BACKFILL_PAGE_DELAY_MS),
            repair_delay: Duration::from_millis(BACKFILL_REPAIR_DELAY_MS),
            read_retry: RetryPolicy::reads(),
        }
    }
}

impl BackfillConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            page_size: env_parse_with_default("SLUGSYNC_BACKFILL_PAGE_SIZE", BACKFILL_PAGE_SIZE),
            write_batch_size: env_parse_with_default(
                "SLUGSYNC_BACKFILL_WRITE_BATCH",
                BACKFILL_WRITE_BATCH_SIZE,
            ),
            ..Self::default()
        }
    }

    /// Write sub-batches never exceed a page.
    pub(crate) fn repair_batch(&self) -> BatchOptions {
        let page = self.page_size.max(1);
        BatchOptions::new(self.write_batch_size.clamp(1, page), Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let sync = SyncConfig::default();
        assert_eq!(sync.batch.batch_size, 100);
        assert_eq!(sync.batch.delay, Duration::from_millis(50));
        assert_eq!(sync.retry_batch.batch_size, 50);
        assert_eq!(sync.retry_batch.delay, Duration::from_millis(200));

        let backfill = BackfillConfig::default();
        assert_eq!(backfill.page_size, 10_000);
        assert_eq!(backfill.repair_batch().batch_size, 1_000);
    }

    #[test]
    fn repair_batch_is_bounded_by_page() {
        let config = BackfillConfig { page_size: 10, write_batch_size: 500, ..Default::default() };
        assert_eq!(config.repair_batch().batch_size, 10);

        let config = BackfillConfig { page_size: 10, write_batch_size: 0, ..Default::default() };
        assert_eq!(config.repair_batch().batch_size, 1);
    }

    #[test]
    fn zero_batch_size_still_progresses() {
        assert_eq!(BatchOptions::new(0, Duration::ZERO).effective_size(), 1);
    }
}
