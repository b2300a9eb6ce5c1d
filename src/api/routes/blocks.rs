//! Block-related routes

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::database::queries::{BlockQueries, TransactionQueries};
use crate::database::Database;
use crate::error::{ExplorerError, Result};
use crate::models::{BlockDetail, BlockRow, PaginatedResponse};

#[derive(Deserialize)]
struct PaginationParams {
    page: Option<i32>,
    page_size: Option<i32>,
}

pub fn routes(database: Arc<Database>) -> Router {
    Router::new()
        .route("/blocks", get(list_blocks))
        .route("/blocks/height/:height", get(get_block_by_height))
        .route("/blocks/:hash", get(get_block_by_hash))
        .with_state(database)
}

#[axum::debug_handler]
async fn list_blocks(
    State(db): State<Arc<Database>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<BlockRow>>> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * page_size;

    let blocks = BlockQueries::list_recent(db.pool(), page_size as i64, offset as i64).await?;
    let total = BlockQueries::count(db.pool()).await?;
    let total_pages = (total as f64 / page_size as f64).ceil() as i32;

    Ok(Json(PaginatedResponse {
        data: blocks,
        total,
        page,
        page_size,
        total_pages,
    }))
}

#[axum::debug_handler]
async fn get_block_by_hash(
    State(db): State<Arc<Database>>,
    Path(hash): Path<String>,
) -> Result<Json<BlockDetail>> {
    let block = BlockQueries::get_by_hash(db.pool(), &hash)
        .await?
        .ok_or_else(|| ExplorerError::NotFound(format!("block {}", hash)))?;
    let transactions = TransactionQueries::list_for_block(db.pool(), &hash).await?;

    Ok(Json(BlockDetail { block, transactions }))
}

#[axum::debug_handler]
async fn get_block_by_height(
    State(db): State<Arc<Database>>,
    Path(height): Path<i64>,
) -> Result<Json<BlockRow>> {
    let block = BlockQueries::get_by_height(db.pool(), height)
        .await?
        .ok_or_else(|| ExplorerError::NotFound(format!("block at height {}", height)))?;

    Ok(Json(block))
}
