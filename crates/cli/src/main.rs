mod commands;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use slugsync_core::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PAGE_URL_PREFIX, DEFAULT_SEARCH_LIMIT,
    DEFAULT_SITEMAP_BASE_URL, env_parse_with_default, env_string_with_default,
};
use slugsync_sitemap::SitemapClient;
use slugsync_storage::PgStorage;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slugsync")]
#[command(about = "Mirror Grokipedia sitemap slugs into PostgreSQL and keep search keys fresh", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every sub-sitemap and upsert its slugs
    Sync {
        /// Run the whole pipeline against an in-memory store
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        batch_delay_ms: Option<u64>,
    },
    /// Recompute missing or stale search keys across the whole table
    Backfill {
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long)]
        write_batch: Option<usize>,
    },
    /// Re-process specific sub-sitemap URLs at the degraded rate
    Retry {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Report whether slugs exist
    Check {
        #[arg(required = true)]
        slugs: Vec<String>,
    },
    /// Find slugs whose search key contains the normalized query
    Search {
        query: String,
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Total rows and rows without a search key
    Stats,
    /// Apply schema migrations and exit
    Migrate,
}

pub(crate) fn get_database_url() -> Result<String> {
    std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable must be set"))
}

pub(crate) async fn connect_storage() -> Result<PgStorage> {
    let url = get_database_url()?;
    Ok(PgStorage::new(&url).await?)
}

pub(crate) fn sitemap_client() -> Result<SitemapClient> {
    let base_url = env_string_with_default("SLUGSYNC_SITEMAP_BASE_URL", DEFAULT_SITEMAP_BASE_URL);
    let page_prefix = env_string_with_default("SLUGSYNC_PAGE_URL_PREFIX", DEFAULT_PAGE_URL_PREFIX);
    let timeout = Duration::from_secs(env_parse_with_default(
        "SLUGSYNC_HTTP_TIMEOUT_SECS",
        DEFAULT_HTTP_TIMEOUT_SECS,
    ));
    Ok(SitemapClient::new(&base_url, &page_prefix, timeout)?)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { dry_run, batch_size, batch_delay_ms } => {
            commands::sync::run_sync(dry_run, batch_size, batch_delay_ms).await
        },
        Commands::Backfill { page_size, write_batch } => {
            commands::backfill::run_backfill(page_size, write_batch).await
        },
        Commands::Retry { urls } => commands::sync::run_retry(&urls).await,
        Commands::Check { slugs } => commands::lookup::run_check(&slugs).await,
        Commands::Search { query, limit } => commands::lookup::run_search(&query, limit).await,
        Commands::Stats => commands::lookup::run_stats().await,
        Commands::Migrate => commands::migrate::run().await,
    }
}
