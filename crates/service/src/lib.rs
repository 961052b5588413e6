//! Service layer for slugsync
//!
//! Orchestrates the sitemap source and the slug store: the batch upsert
//! engine, the full sync with its degraded retry pass, and the cursor
//! backfill that repairs derived search keys.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

mod backfill_service;
mod config;
mod error;
mod lookup_service;
mod report;
mod retry;
mod sync_service;
#[cfg(test)]
mod test_support;
mod upsert;

pub use backfill_service::BackfillService;
pub use config::{BackfillConfig, BatchOptions, SyncConfig};
pub use error::ServiceError;
pub use lookup_service::LookupService;
pub use report::{BackfillOutcome, BackfillReport, SyncReport, UpsertReport};
pub use retry::RetryPolicy;
pub use sync_service::SyncService;
pub use upsert::{UpsertEngine, WriteRow};
