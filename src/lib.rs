//! Bitcoin Blockchain Explorer Backend
//!
//! This crate ingests block and transaction data from an Esplora-style HTTP
//! API into a normalized SQLite store and serves it through a read-only
//! browsing API.

pub mod api;
pub mod database;
pub mod error;
pub mod esplora;
pub mod indexer;
pub mod models;

pub use error::{ExplorerError, Result};

// Type alias for database pool
pub type DbPool = sqlx::SqlitePool;
