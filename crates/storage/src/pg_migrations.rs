//! PostgreSQL schema migrations for the slug table.
//!
//! Every statement is idempotent, so this runs on each connect.

use sqlx::PgPool;

use crate::error::StorageError;

/// Run all PostgreSQL migrations.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS grokipedia_slugs (
            slug TEXT PRIMARY KEY,
            title TEXT,
            last_modified TEXT,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Tables created before the derived key existed get it as a nullable
    // column; the backfill fills it in.
    sqlx::query("ALTER TABLE grokipedia_slugs ADD COLUMN IF NOT EXISTS search_key TEXT")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_slugs_search_key ON grokipedia_slugs (search_key)",
    )
    .execute(pool)
    .await?;

    // Backfill cursor compares and orders in byte order.
    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_slugs_slug_c ON grokipedia_slugs (slug COLLATE "C")"#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("PostgreSQL migrations applied");
    Ok(())
}
