//! Read-side query functions backing the browsing API

use crate::error::Result;
use crate::models::*;
use crate::DbPool;

pub struct BlockQueries;

impl BlockQueries {
    pub async fn list_recent(pool: &DbPool, limit: i64, offset: i64) -> Result<Vec<BlockRow>> {
        let blocks = sqlx::query_as::<_, BlockRow>(
            r#"
            SELECT * FROM blocks
            ORDER BY height DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(blocks)
    }

    pub async fn get_by_hash(pool: &DbPool, hash: &str) -> Result<Option<BlockRow>> {
        let block = sqlx::query_as::<_, BlockRow>("SELECT * FROM blocks WHERE id = ?")
            .bind(hash)
            .fetch_optional(pool)
            .await?;

        Ok(block)
    }

    pub async fn get_by_height(pool: &DbPool, height: i64) -> Result<Option<BlockRow>> {
        let block = sqlx::query_as::<_, BlockRow>("SELECT * FROM blocks WHERE height = ?")
            .bind(height)
            .fetch_optional(pool)
            .await?;

        Ok(block)
    }

    pub async fn count(pool: &DbPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blocks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

pub struct TransactionQueries;

impl TransactionQueries {
    /// A block's transactions, highest fee first. Coinbase rows carry a NULL
    /// fee and sort last.
    pub async fn list_for_block(pool: &DbPool, block_id: &str) -> Result<Vec<TransactionRow>> {
        let txs = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE block_id = ?
            ORDER BY fee DESC
            "#,
        )
        .bind(block_id)
        .fetch_all(pool)
        .await?;

        Ok(txs)
    }

    pub async fn get_by_txid(pool: &DbPool, txid: &str) -> Result<Option<TransactionRow>> {
        let tx = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE txid = ?")
            .bind(txid)
            .fetch_optional(pool)
            .await?;

        Ok(tx)
    }

    pub async fn vouts(pool: &DbPool, txid: &str) -> Result<Vec<VoutRow>> {
        let vouts = sqlx::query_as::<_, VoutRow>(
            "SELECT * FROM vouts WHERE txid = ? ORDER BY vout_n",
        )
        .bind(txid)
        .fetch_all(pool)
        .await?;

        Ok(vouts)
    }

    pub async fn vins(pool: &DbPool, txid: &str) -> Result<Vec<VinRow>> {
        let vins = sqlx::query_as::<_, VinRow>(
            "SELECT * FROM vins WHERE txid = ? ORDER BY vin_n",
        )
        .bind(txid)
        .fetch_all(pool)
        .await?;

        Ok(vins)
    }

    /// A transaction's witness items through the dedup pool, grouped by input
    /// and ordered by stack position.
    pub async fn witness_items(pool: &DbPool, txid: &str) -> Result<Vec<WitnessItemRow>> {
        let items = sqlx::query_as::<_, WitnessItemRow>(
            r#"
            SELECT c.vin_n, c.stack_index, p.witness_data
            FROM vin_witness c
            JOIN witness_pool p ON c.witness_id = p.id
            WHERE c.txid = ?
            ORDER BY c.vin_n, c.stack_index
            "#,
        )
        .bind(txid)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }
}

pub struct StatsQueries;

impl StatsQueries {
    pub async fn chain(pool: &DbPool) -> Result<ChainStats> {
        let block_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blocks")
            .fetch_one(pool)
            .await?;

        let tx_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions")
            .fetch_one(pool)
            .await?;

        let total_volume_sats = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(total_volume_sats), 0) FROM block_stats_view",
        )
        .fetch_one(pool)
        .await?;

        let witness_pool_size = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM witness_pool")
            .fetch_one(pool)
            .await?;

        Ok(ChainStats {
            block_count,
            tx_count,
            total_volume_sats,
            witness_pool_size,
        })
    }
}
