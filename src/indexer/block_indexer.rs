//! Block header writes and sync-status detection

use crate::database::Database;
use crate::error::Result;
use crate::esplora::BlockSummary;
use crate::DbPool;

pub struct BlockIndexer {
    pool: DbPool,
}

impl BlockIndexer {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    /// Insert a block header row; a duplicate hash is a no-op.
    pub async fn insert_header(&self, block: &BlockSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blocks (
                id, height, version, timestamp, tx_count,
                size, weight, merkle_root, difficulty, previous_block_hash
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&block.id)
        .bind(block.height)
        .bind(block.version)
        .bind(block.timestamp)
        .bind(block.tx_count)
        .bind(block.size)
        .bind(block.weight)
        .bind(&block.merkle_root)
        .bind(block.difficulty)
        .bind(&block.previous_block_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Whether at least `expected_tx_count` transactions of this block are
    /// already persisted. A count heuristic: it detects missing pages, not
    /// corrupted rows.
    pub async fn is_fully_synced(&self, block_id: &str, expected_tx_count: i64) -> Result<bool> {
        Ok(self.transaction_count(block_id).await? >= expected_tx_count)
    }

    pub async fn transaction_count(&self, block_id: &str) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions WHERE block_id = $1")
                .bind(block_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
