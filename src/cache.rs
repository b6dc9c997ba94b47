//! Response cache keyed by approximate query equality.
//!
//! A lookup embeds nothing itself: callers pass the query embedding so the
//! cache and the passage index share one embedding space. The single
//! nearest cached query wins if its distance is strictly below the
//! configured threshold. Writes are append-only; [`clear`] — triggered by
//! every successful load — is the only deletion path, because new documents
//! can change the correct answer to any previously asked question.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::embedding::{blob_to_vec, cosine_distance, vec_to_blob};

/// A cache hit: the stored response and its distance to the incoming query.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub query: String,
    pub response: String,
    pub distance: f64,
}

/// Find the nearest cached entry; a hit requires distance strictly below
/// `threshold`.
pub async fn lookup(
    pool: &SqlitePool,
    query_vec: &[f32],
    threshold: f64,
) -> Result<Option<CacheHit>> {
    let rows = sqlx::query("SELECT query, response, embedding FROM response_cache ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut best: Option<CacheHit> = None;

    for row in &rows {
        let blob: Vec<u8> = row.get("embedding");
        let distance = cosine_distance(query_vec, &blob_to_vec(&blob));

        if best.as_ref().map(|b| distance < b.distance).unwrap_or(true) {
            best = Some(CacheHit {
                query: row.get("query"),
                response: row.get("response"),
                distance,
            });
        }
    }

    Ok(best.filter(|hit| hit.distance < threshold))
}

/// Append a (query, response) pair with the query's embedding.
pub async fn store(
    pool: &SqlitePool,
    query: &str,
    response: &str,
    query_vec: &[f32],
) -> Result<()> {
    sqlx::query("INSERT INTO response_cache (query, response, embedding) VALUES (?, ?, ?)")
        .bind(query)
        .bind(response)
        .bind(vec_to_blob(query_vec))
        .execute(pool)
        .await?;
    Ok(())
}

/// Discard every cached entry. Returns the number of entries removed.
pub async fn clear(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM response_cache").execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn threshold_comparison_is_strict() {
        let pool = test_pool().await;

        // Orthogonal vectors give an exactly representable distance of 1.0,
        // so the boundary itself can be probed.
        store(&pool, "q", "stored answer", &[1.0, 0.0]).await.unwrap();
        let probe = [0.0f32, 1.0];

        assert!(
            lookup(&pool, &probe, 1.0).await.unwrap().is_none(),
            "distance == threshold must not hit"
        );

        let hit = lookup(&pool, &probe, 1.0 + 1e-9).await.unwrap().unwrap();
        assert_eq!(hit.response, "stored answer");
        assert!((hit.distance - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn zero_threshold_never_hits() {
        let pool = test_pool().await;

        // A zero threshold disables the cache entirely: even a repeat of
        // the stored query's own embedding must miss.
        let vec = [0.6f32, 0.8, 0.1, 0.3, 0.5];
        store(&pool, "q", "stored answer", &vec).await.unwrap();

        assert!(lookup(&pool, &vec, 0.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn nearest_entry_wins() {
        let pool = test_pool().await;

        store(&pool, "far", "far answer", &[0.0, 1.0]).await.unwrap();
        store(&pool, "near", "near answer", &[1.0, 0.1]).await.unwrap();

        let hit = lookup(&pool, &[1.0, 0.0], 0.5).await.unwrap().unwrap();
        assert_eq!(hit.query, "near");
        assert_eq!(hit.response, "near answer");
    }

    #[tokio::test]
    async fn clear_reports_removed_entries() {
        let pool = test_pool().await;

        store(&pool, "a", "x", &[1.0, 0.0]).await.unwrap();
        store(&pool, "b", "y", &[0.0, 1.0]).await.unwrap();

        assert_eq!(clear(&pool).await.unwrap(), 2);
        assert!(lookup(&pool, &[1.0, 0.0], 2.0).await.unwrap().is_none());
        assert_eq!(clear(&pool).await.unwrap(), 0);
    }
}
