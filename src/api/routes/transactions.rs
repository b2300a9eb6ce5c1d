//! Transaction-related routes

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::database::queries::TransactionQueries;
use crate::database::Database;
use crate::error::{ExplorerError, Result};
use crate::models::TransactionDetail;

pub fn routes(database: Arc<Database>) -> Router {
    Router::new()
        .route("/transactions/:txid", get(get_transaction))
        .with_state(database)
}

#[axum::debug_handler]
async fn get_transaction(
    State(db): State<Arc<Database>>,
    Path(txid): Path<String>,
) -> Result<Json<TransactionDetail>> {
    let transaction = TransactionQueries::get_by_txid(db.pool(), &txid)
        .await?
        .ok_or_else(|| ExplorerError::NotFound(format!("transaction {}", txid)))?;

    let vouts = TransactionQueries::vouts(db.pool(), &txid).await?;
    let vins = TransactionQueries::vins(db.pool(), &txid).await?;

    let mut witnesses: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for item in TransactionQueries::witness_items(db.pool(), &txid).await? {
        witnesses.entry(item.vin_n).or_default().push(item.witness_data);
    }

    Ok(Json(TransactionDetail {
        transaction,
        vouts,
        vins,
        witnesses,
    }))
}
