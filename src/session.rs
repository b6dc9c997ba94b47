//! Session lifecycle: the explicit context struct passed to each operation.
//!
//! One [`Session`] is constructed at startup and torn down on exit — no
//! ambient globals. The working directory (SQLite store + vectors) is
//! ephemeral by default: reset on startup, removed on clean exit. With
//! `keep_data` the store survives restarts; the response cache is still
//! cleared on startup because a stale cache cannot be trusted across runs.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::cache;
use crate::config::Config;
use crate::db;
use crate::embedding::Embedder;
use crate::llm::LlmClient;
use crate::migrate;

pub struct Session {
    pub config: Config,
    pub pool: SqlitePool,
    pub embedder: Box<dyn Embedder>,
    pub llm: Box<dyn LlmClient>,
    keep_data: bool,
}

impl Session {
    /// Open a session: prepare the working directory, connect, migrate.
    pub async fn open(
        config: Config,
        embedder: Box<dyn Embedder>,
        llm: Box<dyn LlmClient>,
        keep_data: bool,
    ) -> Result<Session> {
        if !keep_data {
            db::reset_workdir(&config.data.dir)?;
        }

        let pool = db::connect(&config).await?;
        migrate::run_migrations(&pool).await?;

        if keep_data {
            cache::clear(&pool).await?;
        }

        Ok(Session {
            config,
            pool,
            embedder,
            llm,
            keep_data,
        })
    }

    /// Close the pool and, unless the session keeps data, remove the
    /// working directory.
    pub async fn close(self) -> Result<()> {
        self.pool.close().await;
        if !self.keep_data {
            db::reset_workdir(&self.config.data.dir)?;
        }
        Ok(())
    }
}
