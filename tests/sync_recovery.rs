//! End-to-end ingestion against a mock API: full sync, recovery of a failed
//! page on the next run, and skipping of fully-synced blocks.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;

use btc_explorer::database::Database;
use btc_explorer::esplora::EsploraClient;
use btc_explorer::indexer::{BlockIndexer, IndexerService, SyncOptions};

const BLOCK_HASH: &str = "000000000000000000014a3f";

fn block_summary(tx_count: i64) -> serde_json::Value {
    json!({
        "id": BLOCK_HASH,
        "height": 840001,
        "version": 536870912,
        "timestamp": 1713572000,
        "tx_count": tx_count,
        "size": 998877,
        "weight": 3991234,
        "merkle_root": "9f3a",
        "difficulty": 86388558925171.02
    })
}

fn tx_page(base: i64, count: i64) -> serde_json::Value {
    let txs: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let n = base + i;
            json!({
                "txid": format!("tx{:04}", n),
                "version": 2,
                "locktime": 0,
                "size": 250,
                "weight": 1000,
                "fee": 1000 + n,
                "status": {
                    "confirmed": true,
                    "block_height": 840001,
                    "block_hash": BLOCK_HASH,
                    "block_time": 1713572000
                },
                "vin": [{
                    "is_coinbase": false,
                    "txid": format!("prev{:04}", n),
                    "vout": 0,
                    "sequence": 4294967293u32,
                    "witness": ["3044aabb", "02ccdd"],
                    "prevout": {
                        "value": 60000 + n,
                        "scriptpubkey_address": format!("bc1qsender{}", n)
                    }
                }],
                "vout": [{
                    "value": 50000 + n,
                    "scriptpubkey_address": format!("bc1qreceiver{}", n),
                    "scriptpubkey_type": "v0_p2wpkh"
                }]
            })
        })
        .collect();
    json!(txs)
}

fn test_options() -> SyncOptions {
    SyncOptions {
        block_limit: 10,
        concurrency: 2,
        request_delay: Duration::ZERO,
        block_pause: Duration::ZERO,
    }
}

async fn tx_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE block_id = ?")
        .bind(BLOCK_HASH)
        .fetch_one(db.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn failed_page_leaves_block_under_synced_and_next_run_recovers() {
    let server = MockServer::start_async().await;
    let dir = tempdir().unwrap();
    let database = Arc::new(Database::new(&dir.path().join("test.db")).await.unwrap());
    database.migrate().await.unwrap();

    // A block declaring 30 transactions paginates to offsets [0, 25].
    let blocks_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/blocks");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([block_summary(30)]));
        })
        .await;
    let page0 = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/block/{}/txs/0", BLOCK_HASH));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(tx_page(0, 25));
        })
        .await;
    let page1_broken = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/block/{}/txs/25", BLOCK_HASH));
            then.status(500);
        })
        .await;

    // A budget of one attempt keeps the failing page from sleeping through
    // backoff.
    let client = EsploraClient::new(&server.base_url(), 1).unwrap();
    let service = IndexerService::new(database.clone(), test_options());
    let block_indexer = BlockIndexer::new(&database);

    // First run: page 0 lands, page 1 is lost, the block stays under-synced.
    service.run(&client).await.unwrap();
    assert_eq!(tx_count(&database).await, 25);
    assert!(!block_indexer.is_fully_synced(BLOCK_HASH, 30).await.unwrap());
    assert_eq!(page0.hits_async().await, 1);
    assert_eq!(page1_broken.hits_async().await, 1);

    // The API recovers; the next run re-attempts BOTH pages of the block.
    page1_broken.delete_async().await;
    let page1 = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/block/{}/txs/25", BLOCK_HASH));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(tx_page(25, 5));
        })
        .await;

    service.run(&client).await.unwrap();
    assert_eq!(tx_count(&database).await, 30);
    assert!(block_indexer.is_fully_synced(BLOCK_HASH, 30).await.unwrap());
    // Page 0 was re-fetched and re-inserted as a no-op.
    assert_eq!(page0.hits_async().await, 2);
    assert_eq!(page1.hits_async().await, 1);

    // Third run: the count check short-circuits, no page is fetched again.
    service.run(&client).await.unwrap();
    assert_eq!(page0.hits_async().await, 2);
    assert_eq!(page1.hits_async().await, 1);
    assert_eq!(blocks_mock.hits_async().await, 3);
    assert_eq!(tx_count(&database).await, 30);

    // Every input carried two witness items; the repeated payloads collapse
    // to two pool entries.
    let witness_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vin_witness")
        .fetch_one(database.pool())
        .await
        .unwrap();
    assert_eq!(witness_items, 60);
    let pool_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM witness_pool")
        .fetch_one(database.pool())
        .await
        .unwrap();
    assert_eq!(pool_entries, 2);
}

#[tokio::test]
async fn unavailable_block_list_is_not_fatal() {
    let server = MockServer::start_async().await;
    let dir = tempdir().unwrap();
    let database = Arc::new(Database::new(&dir.path().join("test.db")).await.unwrap());
    database.migrate().await.unwrap();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/blocks");
            then.status(503);
        })
        .await;

    let client = EsploraClient::new(&server.base_url(), 1).unwrap();
    let service = IndexerService::new(database.clone(), test_options());

    // The pass degrades to a no-op instead of erroring out.
    service.run(&client).await.unwrap();

    let blocks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blocks")
        .fetch_one(database.pool())
        .await
        .unwrap();
    assert_eq!(blocks, 0);
}
