use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use slugsync_service::{BackfillConfig, BackfillService, RetryPolicy, UpsertEngine};

use crate::{connect_storage, print_json};

/// Exit status telling operators the walk stopped before the end of the table.
const EXIT_TRUNCATED: u8 = 2;

pub(crate) async fn run_backfill(
    page_size: Option<usize>,
    write_batch: Option<usize>,
) -> Result<ExitCode> {
    let mut config = BackfillConfig::from_env();
    if let Some(size) = page_size {
        config.page_size = size;
    }
    if let Some(size) = write_batch {
        config.write_batch_size = size;
    }

    let storage = Arc::new(connect_storage().await?);
    let engine = UpsertEngine::new(storage, RetryPolicy::writes());
    let report = BackfillService::new(engine, config).run().await;
    print_json(&report)?;

    if report.is_truncated() {
        return Ok(ExitCode::from(EXIT_TRUNCATED));
    }
    Ok(ExitCode::SUCCESS)
}
