//! Passage store writes and the per-collection similarity index.
//!
//! The index is one embedding vector per passage, kept in `passage_vectors`
//! and searched by brute-force exact k-NN. [`build_or_refresh`] runs
//! synchronously inside every load, so a completed load always leaves
//! vector count == passage count for its collection. [`knn`] refuses to
//! serve a collection whose index is stale (an interrupted load) rather
//! than ranking a partial index.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::embedding::{blob_to_vec, cosine_distance, vec_to_blob, Embedder};
use crate::models::{Collection, Passage, ScoredPassage};

/// Append passages to the store in one transaction. No partial rows are
/// committed on failure, and existing rows are never mutated or reordered.
pub async fn insert_passages(
    pool: &SqlitePool,
    collection: Collection,
    passages: &[Passage],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    for passage in passages {
        sqlx::query(
            r#"
            INSERT INTO passages (collection, source_id, page, paragraph_index, text)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection.as_str())
        .bind(&passage.source_id)
        .bind(passage.page)
        .bind(passage.paragraph_index)
        .bind(&passage.text)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Embed every passage in the collection that does not have a vector yet.
///
/// Re-running after a failed attempt picks up exactly the missing vectors,
/// so an interrupted load is repaired by loading (or refreshing) again.
/// Returns the number of vectors written.
pub async fn build_or_refresh(
    pool: &SqlitePool,
    embedder: &dyn Embedder,
    batch_size: usize,
    collection: Collection,
) -> Result<u64> {
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.text
        FROM passages p
        LEFT JOIN passage_vectors v ON v.passage_id = p.id
        WHERE p.collection = ? AND v.passage_id IS NULL
        ORDER BY p.id
        "#,
    )
    .bind(collection.as_str())
    .fetch_all(pool)
    .await?;

    let pending: Vec<(i64, String)> = rows
        .iter()
        .map(|row| (row.get("id"), row.get("text")))
        .collect();

    let mut written = 0u64;

    for batch in pending.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;

        if vectors.len() != batch.len() {
            bail!(
                "Embedder returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            );
        }

        let mut tx = pool.begin().await?;
        for ((passage_id, _), vector) in batch.iter().zip(vectors.iter()) {
            sqlx::query(
                "INSERT INTO passage_vectors (passage_id, collection, embedding) VALUES (?, ?, ?)",
            )
            .bind(passage_id)
            .bind(collection.as_str())
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
            written += 1;
        }
        tx.commit().await?;
    }

    Ok(written)
}

/// Number of passages in a collection.
pub async fn passage_count(pool: &SqlitePool, collection: Collection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM passages WHERE collection = ?")
        .bind(collection.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Return the `k` passages nearest to the query embedding, ascending by
/// cosine distance, ties broken by insertion order.
///
/// A collection with zero indexed passages yields an empty result. A
/// collection with unembedded passages (interrupted load) is an error.
pub async fn knn(
    pool: &SqlitePool,
    collection: Collection,
    query_vec: &[f32],
    k: usize,
) -> Result<Vec<ScoredPassage>> {
    let unindexed: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM passages p
        LEFT JOIN passage_vectors v ON v.passage_id = p.id
        WHERE p.collection = ? AND v.passage_id IS NULL
        "#,
    )
    .bind(collection.as_str())
    .fetch_one(pool)
    .await?;

    if unindexed > 0 {
        bail!(
            "similarity index for collection '{}' is stale ({} unembedded passages); reload the source to repair it",
            collection,
            unindexed
        );
    }

    let rows = sqlx::query(
        r#"
        SELECT p.source_id, p.page, p.paragraph_index, p.text, v.embedding
        FROM passages p
        JOIN passage_vectors v ON v.passage_id = p.id
        WHERE p.collection = ?
        ORDER BY p.id
        "#,
    )
    .bind(collection.as_str())
    .fetch_all(pool)
    .await?;

    let mut scored: Vec<ScoredPassage> = rows
        .iter()
        .map(|row| {
            let blob: Vec<u8> = row.get("embedding");
            let vector = blob_to_vec(&blob);
            ScoredPassage {
                collection,
                passage: Passage {
                    source_id: row.get("source_id"),
                    page: row.get("page"),
                    paragraph_index: row.get("paragraph_index"),
                    text: row.get("text"),
                },
                distance: cosine_distance(query_vec, &vector),
            }
        })
        .collect();

    // Stable sort keeps insertion order on equal distances.
    scored.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);

    Ok(scored)
}
