//! Sync orchestrator
//!
//! Drives ingestion block by block: skip blocks the store already holds in
//! full, store the header, then fan the block's transaction pages out over a
//! bounded fetch pool and persist each page as its fetch completes. A page
//! that stays unavailable or fails to store leaves the block under-synced;
//! the next run's count check picks it up and the whole block is re-fetched,
//! which is safe because every write is idempotent.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::database::Database;
use crate::error::Result;
use crate::esplora::{BlockSummary, EsploraClient};
use crate::indexer::{BlockIndexer, TransactionIndexer};

/// Transactions per page of the upstream API.
pub const TX_PAGE_SIZE: i64 = 25;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// How many of the most recent blocks one pass processes.
    pub block_limit: usize,
    /// Concurrent page fetches within a block. 1 serializes requests, the
    /// safest setting against undocumented rate limits.
    pub concurrency: usize,
    /// Pause before each page fetch.
    pub request_delay: Duration,
    /// Pause between blocks.
    pub block_pause: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            block_limit: 10,
            concurrency: 1,
            request_delay: Duration::from_millis(500),
            block_pause: Duration::from_secs(1),
        }
    }
}

/// Pagination offsets covering `tx_count` transactions at a fixed stride.
pub fn page_offsets(tx_count: i64, stride: i64) -> Vec<i64> {
    (0..tx_count.max(0)).step_by(stride as usize).collect()
}

pub struct IndexerService {
    block_indexer: BlockIndexer,
    tx_indexer: TransactionIndexer,
    options: SyncOptions,
}

impl IndexerService {
    pub fn new(database: Arc<Database>, options: SyncOptions) -> Self {
        Self {
            block_indexer: BlockIndexer::new(&database),
            tx_indexer: TransactionIndexer::new(&database),
            options,
        }
    }

    /// One ingestion pass over the most recent blocks. Blocks are processed
    /// strictly sequentially; a block that fails is logged and the pass moves
    /// on, leaving recovery to the next run.
    pub async fn run(&self, client: &EsploraClient) -> Result<()> {
        info!("Starting ingestion pass");

        let Some(blocks) = client.recent_blocks().await else {
            warn!("Recent block list unavailable, nothing to do");
            return Ok(());
        };

        for block in blocks.iter().take(self.options.block_limit) {
            if let Err(err) = self.sync_block(client, block).await {
                error!("Block #{} failed: {}", block.height, err);
            }
            sleep(self.options.block_pause).await;
        }

        info!("Ingestion pass complete");
        Ok(())
    }

    /// Sync a single block. Returns the number of transactions stored by
    /// this call (zero for an already-synced block).
    pub async fn sync_block(&self, client: &EsploraClient, block: &BlockSummary) -> Result<i64> {
        let expected = block.tx_count;

        if self.block_indexer.is_fully_synced(&block.id, expected).await? {
            info!("Block #{} already fully synced, skipping", block.height);
            return Ok(0);
        }

        self.block_indexer.insert_header(block).await?;

        let offsets = page_offsets(expected, TX_PAGE_SIZE);
        let mined_at = chrono::DateTime::from_timestamp(block.timestamp, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        info!(
            "Block #{} (mined {}): syncing {} transactions across {} pages",
            block.height,
            mined_at,
            expected,
            offsets.len()
        );

        let request_delay = self.options.request_delay;
        let mut pages = stream::iter(offsets)
            .map(|offset| async move {
                if !request_delay.is_zero() {
                    sleep(request_delay).await;
                }
                (offset, client.block_txs(&block.id, offset).await)
            })
            .buffer_unordered(self.options.concurrency.max(1));

        // Pages are disjoint transaction ranges, so storing them in
        // completion order is safe.
        let mut stored: i64 = 0;
        while let Some((offset, page)) = pages.next().await {
            match page {
                Some(txs) => match self.tx_indexer.insert_batch(&txs, &block.id, offset).await {
                    Ok(count) => {
                        stored += count;
                        info!(
                            "Block #{}: {}/{} transactions indexed",
                            block.height, stored, expected
                        );
                    }
                    Err(err) => {
                        error!(
                            "Block #{}: batch at offset {} failed to store: {}",
                            block.height, offset, err
                        );
                    }
                },
                None => {
                    warn!(
                        "Block #{}: page at offset {} unavailable, skipping",
                        block.height, offset
                    );
                }
            }
        }

        if self.block_indexer.is_fully_synced(&block.id, expected).await? {
            info!("Block #{} fully indexed", block.height);
        } else {
            warn!(
                "Block #{} under-synced ({} of {} stored), next run will retry it",
                block.height, stored, expected
            );
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_cover_the_declared_count() {
        assert_eq!(page_offsets(30, 25), vec![0, 25]);
        assert_eq!(page_offsets(25, 25), vec![0]);
        assert_eq!(page_offsets(26, 25), vec![0, 25]);
        assert_eq!(page_offsets(1, 25), vec![0]);
        assert_eq!(page_offsets(3050, 25).len(), 122);
    }

    #[test]
    fn offsets_are_empty_for_empty_blocks() {
        assert_eq!(page_offsets(0, 25), Vec::<i64>::new());
        assert_eq!(page_offsets(-1, 25), Vec::<i64>::new());
    }
}
