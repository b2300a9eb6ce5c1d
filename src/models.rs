//! Data models for the explorer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlockRow {
    pub id: String,
    pub height: i64,
    pub version: Option<i64>,
    pub timestamp: i64,
    pub tx_count: i64,
    pub size: Option<i64>,
    pub weight: Option<i64>,
    pub merkle_root: Option<String>,
    pub difficulty: Option<f64>,
    pub previous_block_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TransactionRow {
    pub txid: String,
    pub block_id: String,
    pub tx_index: Option<i64>,
    pub version: Option<i64>,
    pub locktime: Option<i64>,
    pub size: Option<i64>,
    pub weight: Option<i64>,
    pub fee: Option<i64>,
    pub status_confirmed: Option<bool>,
    pub status_block_height: Option<i64>,
    pub status_block_hash: Option<String>,
    pub status_block_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoutRow {
    pub txid: String,
    pub vout_n: i64,
    pub value: Option<i64>,
    pub scriptpubkey_address: Option<String>,
    pub scriptpubkey_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VinRow {
    pub txid: String,
    pub vin_n: i64,
    pub is_coinbase: bool,
    pub prevout_txid: Option<String>,
    pub prevout_vout_n: Option<i64>,
    pub prevout_value: Option<i64>,
    pub prevout_address: Option<String>,
    pub scriptsig: Option<String>,
    pub scriptsig_asm: Option<String>,
    pub sequence: Option<i64>,
}

/// One witness stack item, joined out of the content-addressed pool.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WitnessItemRow {
    pub vin_n: i64,
    pub stack_index: i64,
    pub witness_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDetail {
    pub block: BlockRow,
    pub transactions: Vec<TransactionRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub transaction: TransactionRow,
    pub vouts: Vec<VoutRow>,
    pub vins: Vec<VinRow>,
    /// Witness stacks keyed by input index, in stack order.
    pub witnesses: BTreeMap<i64, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStats {
    pub block_count: i64,
    pub tx_count: i64,
    pub total_volume_sats: i64,
    pub witness_pool_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i32,
    pub page_size: i32,
    pub total_pages: i32,
}
