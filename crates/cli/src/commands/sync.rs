use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use slugsync_service::{RetryPolicy, SyncConfig, SyncService, UpsertEngine};
use slugsync_storage::{MemoryStore, SlugStore};

use crate::{connect_storage, print_json, sitemap_client};

async fn build_service(config: SyncConfig, dry_run: bool) -> Result<SyncService> {
    let store: Arc<dyn SlugStore> = if dry_run {
        tracing::info!("Dry run: writes go to an in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(connect_storage().await?)
    };
    let source = Arc::new(sitemap_client()?);
    let engine = UpsertEngine::new(store, RetryPolicy::writes());
    Ok(SyncService::new(source, engine, config))
}

pub(crate) async fn run_sync(
    dry_run: bool,
    batch_size: Option<usize>,
    batch_delay_ms: Option<u64>,
) -> Result<ExitCode> {
    let mut config = SyncConfig::from_env();
    if let Some(size) = batch_size {
        config.batch.batch_size = size;
    }
    if let Some(ms) = batch_delay_ms {
        config.batch.delay = Duration::from_millis(ms);
    }

    let report = build_service(config, dry_run).await?.run().await?;
    if !report.is_complete() {
        tracing::warn!(
            sitemaps = ?report.unrecovered,
            "Some sitemaps failed twice; rerun with `slugsync retry <url>...`"
        );
    }
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

pub(crate) async fn run_retry(urls: &[String]) -> Result<ExitCode> {
    let report = build_service(SyncConfig::from_env(), false).await?.retry_sitemaps(urls).await;
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}
