//! Shared constants for slugsync.
//!
//! Centralizes remote endpoints, table names and pacing defaults so the
//! sync and backfill paths cannot drift apart.

/// Base URL of the remote sitemap tree (the index lives at `{base}/sitemap-index.xml`).
pub const DEFAULT_SITEMAP_BASE_URL: &str = "https://assets.grokipedia.com/sitemap";

/// File name of the sitemap index relative to the base URL.
pub const SITEMAP_INDEX_FILE: &str = "sitemap-index.xml";

/// Prefix stripped from every `<loc>` to obtain the raw slug path segment.
pub const DEFAULT_PAGE_URL_PREFIX: &str = "https://grokipedia.com/page/";

/// Timeout applied to every remote HTTP request, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Sub-batch size used by the main sync pass.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Pause after each successful sub-batch in the main sync pass, in milliseconds.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 50;

/// Sub-batch size used by the degraded retry pass.
pub const RETRY_BATCH_SIZE: usize = 50;

/// Pause after each successful sub-batch in the degraded retry pass, in milliseconds.
pub const RETRY_BATCH_DELAY_MS: u64 = 200;

/// Pause between two sub-sitemaps, in milliseconds.
pub const DEFAULT_SITEMAP_DELAY_MS: u64 = 100;

/// Rows fetched per backfill page.
pub const BACKFILL_PAGE_SIZE: usize = 10_000;

/// Repairs written per backfill sub-batch (kept below the page size).
pub const BACKFILL_WRITE_BATCH_SIZE: usize = 1_000;

/// Pause after every fetched backfill page, in milliseconds.
pub const BACKFILL_PAGE_DELAY_MS: u64 = 500;

/// Pause after a backfill page that needed repairs, in milliseconds.
pub const BACKFILL_REPAIR_DELAY_MS: u64 = 1_000;

/// Attempts per remote call before the caller degrades.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base backoff for store writes; attempt `n` waits `n × base`.
pub const WRITE_RETRY_BASE_MS: u64 = 1_000;

/// Base backoff for backfill page reads and the sitemap index; attempt `n` waits `n × base`.
pub const READ_RETRY_BASE_MS: u64 = 2_000;

/// Upper bound on entries held in memory for the retry pass.
pub const RETRY_CACHE_MAX_ENTRIES: usize = 500_000;

/// Maximum number of slugs accepted by one existence check.
pub const MAX_CHECK_SLUGS: usize = 50;

/// Maximum length (in chars) of a slug accepted by lookups.
pub const MAX_LOOKUP_SLUG_LEN: usize = 200;

/// Default number of matches returned by a search-key lookup.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Maximum number of matches returned by a search-key lookup.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 4;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;
