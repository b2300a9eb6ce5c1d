//! Ingestion pipeline: idempotent writers and the sync orchestrator

pub mod block_indexer;
pub mod service;
pub mod transaction_indexer;

pub use block_indexer::BlockIndexer;
pub use service::{IndexerService, SyncOptions};
pub use transaction_indexer::TransactionIndexer;
