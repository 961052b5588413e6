use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use slugsync_service::LookupService;

use crate::{connect_storage, print_json};

async fn lookup_service() -> Result<LookupService> {
    Ok(LookupService::new(Arc::new(connect_storage().await?)))
}

pub(crate) async fn run_check(slugs: &[String]) -> Result<ExitCode> {
    let checks = lookup_service().await?.check(slugs).await?;
    print_json(&checks)?;
    Ok(ExitCode::SUCCESS)
}

pub(crate) async fn run_search(query: &str, limit: usize) -> Result<ExitCode> {
    let results = lookup_service().await?.search(query, limit).await?;
    print_json(&results)?;
    Ok(ExitCode::SUCCESS)
}

pub(crate) async fn run_stats() -> Result<ExitCode> {
    let stats = lookup_service().await?.stats().await?;
    print_json(&stats)?;
    Ok(ExitCode::SUCCESS)
}
