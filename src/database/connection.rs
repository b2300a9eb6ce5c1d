//! Database connection management

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::Executor;

use crate::error::Result;
use crate::DbPool;

const DROP_SCHEMA: &str = r#"
DROP VIEW IF EXISTS block_stats_view;
DROP TABLE IF EXISTS vin_witness;
DROP TABLE IF EXISTS witness_pool;
DROP TABLE IF EXISTS vins;
DROP TABLE IF EXISTS vouts;
DROP TABLE IF EXISTS transactions;
DROP TABLE IF EXISTS blocks;
"#;

pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new(database_path: &Path) -> Result<Self> {
        // Ensure the database directory exists
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        self.pool
            .execute(include_str!("../../migrations/001_initial_schema.sql"))
            .await?;
        Ok(())
    }

    /// Drop every table in reverse dependency order and rebuild the schema.
    /// The only path that deletes data; normal ingestion never mutates rows.
    pub async fn reset(&self) -> Result<()> {
        self.pool.execute(DROP_SCHEMA).await?;
        self.migrate().await
    }
}
