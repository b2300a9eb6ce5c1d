//! Read-only browsing API

pub mod routes;
pub mod server;

pub use server::ApiServer;
