//! Normalized transaction batch writes
//!
//! Each batch commits atomically: the transaction rows, their outputs,
//! inputs, and witness items all land or none do. Witness payloads are
//! deduplicated through a content-addressed pool and correlated back to
//! inputs via a junction table.

use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;

use crate::database::Database;
use crate::error::Result;
use crate::esplora::{Tx, Vin, Vout};
use crate::DbPool;

pub struct TransactionIndexer {
    pool: DbPool,
}

impl TransactionIndexer {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }

    /// Insert one page of transactions for a block. `base_index` is the
    /// pagination offset of the page, so `base_index + i` is the position of
    /// the i-th transaction in the block. Duplicate rows are ignored, making
    /// re-runs of the same page a no-op. Returns the number of transactions
    /// processed.
    pub async fn insert_batch(&self, txs: &[Tx], block_id: &str, base_index: i64) -> Result<i64> {
        if txs.is_empty() {
            return Ok(0);
        }

        let mut db_tx = self.pool.begin().await?;

        for (i, tx) in txs.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transactions (
                    txid, block_id, tx_index, version, locktime, size, weight, fee,
                    status_confirmed, status_block_height, status_block_hash, status_block_time
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (txid) DO NOTHING
                "#,
            )
            .bind(&tx.txid)
            .bind(block_id)
            .bind(base_index + i as i64)
            .bind(tx.version)
            .bind(tx.locktime)
            .bind(tx.size)
            .bind(tx.weight)
            .bind(tx.fee)
            .bind(tx.status.confirmed)
            .bind(tx.status.block_height)
            .bind(&tx.status.block_hash)
            .bind(tx.status.block_time)
            .execute(&mut *db_tx)
            .await?;

            for (n, vout) in tx.vout.iter().enumerate() {
                insert_vout(&mut db_tx, &tx.txid, n as i64, vout).await?;
            }

            for (n, vin) in tx.vin.iter().enumerate() {
                insert_vin(&mut db_tx, &tx.txid, n as i64, vin).await?;
            }
        }

        // A failed batch rolls back when the transaction guard drops.
        db_tx.commit().await?;

        Ok(txs.len() as i64)
    }
}

async fn insert_vout(conn: &mut SqliteConnection, txid: &str, n: i64, vout: &Vout) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO vouts (txid, vout_n, value, scriptpubkey_address, scriptpubkey_type)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(txid)
    .bind(n)
    .bind(vout.value)
    .bind(&vout.scriptpubkey_address)
    .bind(&vout.scriptpubkey_type)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_vin(conn: &mut SqliteConnection, txid: &str, n: i64, vin: &Vin) -> Result<()> {
    // The prevout is a denormalized snapshot, not a foreign key: the spent
    // output may belong to a transaction outside the ingested window.
    let (prevout_txid, prevout_vout_n) = if vin.is_coinbase {
        (None, None)
    } else {
        (vin.txid.as_deref(), vin.vout)
    };
    let prevout = vin.prevout.clone().unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO vins (
            txid, vin_n, is_coinbase, prevout_txid, prevout_vout_n,
            prevout_value, prevout_address, scriptsig, scriptsig_asm, sequence
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(txid)
    .bind(n)
    .bind(vin.is_coinbase)
    .bind(prevout_txid)
    .bind(prevout_vout_n)
    .bind(prevout.value)
    .bind(&prevout.scriptpubkey_address)
    .bind(&vin.scriptsig)
    .bind(&vin.scriptsig_asm)
    .bind(vin.sequence)
    .execute(&mut *conn)
    .await?;

    for (stack_index, item) in vin.witness.iter().enumerate() {
        insert_witness_item(conn, txid, n, stack_index as i64, item).await?;
    }

    Ok(())
}

async fn insert_witness_item(
    conn: &mut SqliteConnection,
    txid: &str,
    vin_n: i64,
    stack_index: i64,
    item: &str,
) -> Result<()> {
    let witness_hash = hex::encode(Sha256::digest(item.as_bytes()));

    // Upsert into the pool without touching existing content; the no-op
    // DO UPDATE makes RETURNING yield the row id either way.
    let witness_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO witness_pool (witness_hash, witness_data)
        VALUES ($1, $2)
        ON CONFLICT (witness_hash) DO UPDATE SET witness_hash = excluded.witness_hash
        RETURNING id
        "#,
    )
    .bind(&witness_hash)
    .bind(item)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO vin_witness (txid, vin_n, stack_index, witness_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(txid)
    .bind(vin_n)
    .bind(stack_index)
    .bind(witness_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
