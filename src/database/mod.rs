//! Database layer: connection management and read-side queries

pub mod connection;
pub mod queries;

pub use connection::Database;
