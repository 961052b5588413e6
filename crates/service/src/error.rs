//! Typed error enum for the service layer.
//!
//! Only two conditions ever escape an orchestrator: the sitemap index being
//! unreachable, and the store refusing every write of a sub-batch. Everything
//! per-entry or per-sitemap is folded into report counters instead.

use slugsync_core::SlugError;
use slugsync_sitemap::FetchError;
use slugsync_storage::StorageError;
use thiserror::Error;

use crate::report::UpsertReport;

/// Service-layer error unifying fetch, storage and input failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Sitemap request failed (index or sub-sitemap).
    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),

    /// Storage operation failed outside the write path (lookups, stats).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Store rejected a whole sub-batch with transient errors; it is most
    /// likely down. `progress` holds the counts reached before stopping.
    #[error("write aborted after {} written, {} failed: {source}", progress.written, progress.failed)]
    WriteAborted {
        progress: UpsertReport,
        #[source]
        source: StorageError,
    },

    /// Caller provided invalid input (empty query, too many slugs).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] SlugError),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_transient(),
            Self::Storage(e) => e.is_transient(),
            Self::WriteAborted { .. } => true,
            Self::InvalidInput(_) => false,
        }
    }
}
