//! SlugStore implementation for PgStorage.

use async_trait::async_trait;
use slugsync_core::{SearchKeyUpdate, SlugRecord, SlugStats, StoredSlug};

use super::{PgStorage, SLUG_COLUMNS, escape_like, row_to_stored_slug, usize_to_i64};
use crate::error::StorageError;
use crate::traits::SlugStore;

#[async_trait]
impl SlugStore for PgStorage {
    async fn upsert_slugs(&self, records: &[SlugRecord]) -> Result<u64, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut slugs = Vec::with_capacity(records.len());
        let mut titles = Vec::with_capacity(records.len());
        let mut keys = Vec::with_capacity(records.len());
        let mut modified = Vec::with_capacity(records.len());
        let mut updated = Vec::with_capacity(records.len());
        for r in records {
            slugs.push(r.slug.as_str());
            titles.push(r.title.as_deref());
            keys.push(r.search_key.as_str());
            modified.push(r.last_modified.as_deref());
            updated.push(r.updated_at);
        }

        let result = sqlx::query(
            r#"INSERT INTO grokipedia_slugs (slug, title, search_key, last_modified, updated_at)
               SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::timestamptz[])
               ON CONFLICT (slug) DO UPDATE SET
                   title = EXCLUDED.title,
                   search_key = EXCLUDED.search_key,
                   last_modified = EXCLUDED.last_modified,
                   updated_at = EXCLUDED.updated_at"#,
        )
        .bind(&slugs)
        .bind(&titles)
        .bind(&keys)
        .bind(&modified)
        .bind(&updated)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_search_keys(&self, updates: &[SearchKeyUpdate]) -> Result<u64, StorageError> {
        if updates.is_empty() {
            return Ok(0);
        }
        let slugs: Vec<&str> = updates.iter().map(|u| u.slug.as_str()).collect();
        let keys: Vec<&str> = updates.iter().map(|u| u.search_key.as_str()).collect();

        let result = sqlx::query(
            r#"UPDATE grokipedia_slugs AS s
               SET search_key = u.search_key, updated_at = NOW()
               FROM UNNEST($1::text[], $2::text[]) AS u(slug, search_key)
               WHERE s.slug = u.slug"#,
        )
        .bind(&slugs)
        .bind(&keys)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredSlug>, StorageError> {
        let rows = match after {
            Some(cursor) => {
                sqlx::query(&format!(
                    r#"SELECT {SLUG_COLUMNS} FROM grokipedia_slugs
                       WHERE slug COLLATE "C" > $1
                       ORDER BY slug COLLATE "C" LIMIT $2"#
                ))
                .bind(cursor)
                .bind(usize_to_i64(limit))
                .fetch_all(&self.pool)
                .await?
            },
            None => {
                sqlx::query(&format!(
                    r#"SELECT {SLUG_COLUMNS} FROM grokipedia_slugs
                       ORDER BY slug COLLATE "C" LIMIT $1"#
                ))
                .bind(usize_to_i64(limit))
                .fetch_all(&self.pool)
                .await?
            },
        };
        rows.iter().map(row_to_stored_slug).collect()
    }

    async fn find_slugs(&self, slugs: &[String]) -> Result<Vec<StoredSlug>, StorageError> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {SLUG_COLUMNS} FROM grokipedia_slugs WHERE slug = ANY($1)"
        ))
        .bind(slugs)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_stored_slug).collect()
    }

    async fn search_by_key(
        &self,
        key: &str,
        limit: usize,
    ) -> Result<Vec<StoredSlug>, StorageError> {
        let pattern = format!("%{}%", escape_like(key));
        let rows = sqlx::query(&format!(
            r#"SELECT {SLUG_COLUMNS} FROM grokipedia_slugs
               WHERE search_key LIKE $1 ESCAPE '\'
               ORDER BY length(search_key), search_key COLLATE "C"
               LIMIT $2"#
        ))
        .bind(pattern)
        .bind(usize_to_i64(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_stored_slug).collect()
    }

    async fn stats(&self) -> Result<SlugStats, StorageError> {
        let (total, missing): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE search_key IS NULL) FROM grokipedia_slugs",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(SlugStats {
            total: u64::try_from(total).unwrap_or(0),
            missing_search_key: u64::try_from(missing).unwrap_or(0),
        })
    }
}
