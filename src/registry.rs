//! Document registry: the single source of truth for "is this source
//! already loaded."
//!
//! Lookup is exact string match. A different URL fragment or trailing slash
//! is a different source — a known looseness, not silently fixed here.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::models::DocumentRecord;

pub async fn is_loaded(pool: &SqlitePool, source_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE source_id = ?")
        .bind(source_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn register(pool: &SqlitePool, source_id: &str, loaded_at: DateTime<Utc>) -> Result<()> {
    sqlx::query("INSERT INTO documents (source_id, loaded_at) VALUES (?, ?)")
        .bind(source_id)
        .bind(loaded_at.timestamp())
        .execute(pool)
        .await?;
    Ok(())
}

/// All registered sources in load order. Timestamps only have second
/// granularity, so insertion order (rowid) is the ordering key.
pub async fn list(pool: &SqlitePool) -> Result<Vec<DocumentRecord>> {
    let rows = sqlx::query("SELECT source_id, loaded_at FROM documents ORDER BY rowid")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let ts: i64 = row.get("loaded_at");
            DocumentRecord {
                source_id: row.get("source_id"),
                loaded_at: DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now),
            }
        })
        .collect())
}
