//! Aggregate statistics route

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::database::queries::StatsQueries;
use crate::database::Database;
use crate::error::Result;
use crate::models::ChainStats;

pub fn routes(database: Arc<Database>) -> Router {
    Router::new()
        .route("/stats", get(get_chain_stats))
        .with_state(database)
}

#[axum::debug_handler]
async fn get_chain_stats(State(db): State<Arc<Database>>) -> Result<Json<ChainStats>> {
    Ok(Json(StatsQueries::chain(db.pool()).await?))
}
