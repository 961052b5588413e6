//! Counters returned by each orchestration step.
//!
//! Reports are plain values threaded through return types and merged by the
//! caller; no step shares mutable counters with another.

use serde::Serialize;

/// Outcome of one engine call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    /// Rows acknowledged by the store.
    pub written: u64,
    /// Entries rejected by sanitization or by the store after fallback.
    pub failed: u64,
    /// Entries superseded by a later entry with the same slug in their sub-batch.
    pub deduplicated: u64,
}

impl UpsertReport {
    pub fn merge(&mut self, other: Self) {
        self.written = self.written.saturating_add(other.written);
        self.failed = self.failed.saturating_add(other.failed);
        self.deduplicated = self.deduplicated.saturating_add(other.deduplicated);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub sitemaps_total: usize,
    /// Sitemaps fully processed in the main pass.
    pub sitemaps_ok: usize,
    /// Sitemaps replayed by the degraded retry pass.
    pub sitemaps_retried: usize,
    /// Retried sitemaps that succeeded on replay.
    pub sitemaps_recovered: usize,
    /// Sitemaps still failing after the retry pass.
    pub unrecovered: Vec<String>,
    pub entries_seen: u64,
    pub upserted: u64,
    pub failed: u64,
    pub deduplicated: u64,
    pub elapsed_secs: f64,
}

impl SyncReport {
    pub(crate) fn absorb(&mut self, upsert: UpsertReport) {
        self.upserted = self.upserted.saturating_add(upsert.written);
        self.failed = self.failed.saturating_add(upsert.failed);
        self.deduplicated = self.deduplicated.saturating_add(upsert.deduplicated);
    }

    /// Whether every sitemap ended up processed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unrecovered.is_empty()
    }
}

/// How a backfill run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackfillOutcome {
    /// An empty page was reached: every row was visited.
    Completed,
    /// A page fetch kept failing; rows after `after` were not visited.
    Truncated { after: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillReport {
    /// Rows visited.
    pub processed: u64,
    /// Rows whose key was rewritten.
    pub repaired: u64,
    /// Repairs the store refused.
    pub failed: u64,
    /// Page fetches issued, the final empty page included.
    pub pages: u64,
    pub outcome: BackfillOutcome,
    pub elapsed_secs: f64,
}

impl BackfillReport {
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        matches!(self.outcome, BackfillOutcome::Truncated { .. })
    }
}
