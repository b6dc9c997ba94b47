use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Passage store: append-only per load, reset only with the working dir.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS passages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            source_id TEXT NOT NULL,
            page INTEGER NOT NULL,
            paragraph_index INTEGER NOT NULL,
            text TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One embedding vector per passage, keyed by passage rowid.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS passage_vectors (
            passage_id INTEGER PRIMARY KEY,
            collection TEXT NOT NULL,
            embedding BLOB NOT NULL,
            FOREIGN KEY (passage_id) REFERENCES passages(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Document registry: the dedup gate for `load`.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            source_id TEXT PRIMARY KEY,
            loaded_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Response cache, keyed by approximate query equality.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS response_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            query TEXT NOT NULL,
            response TEXT NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_passages_collection ON passages(collection)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_passage_vectors_collection ON passage_vectors(collection)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
