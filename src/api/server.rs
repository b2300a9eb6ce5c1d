//! API server implementation

use std::sync::Arc;

use axum::{http::Method, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::routes;
use crate::database::Database;
use crate::error::Result;

pub struct ApiServer {
    database: Arc<Database>,
    port: u16,
}

impl ApiServer {
    pub fn new(database: Arc<Database>, port: u16) -> Self {
        Self { database, port }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any);

        Router::new()
            .nest(
                "/api/v1",
                Router::new()
                    .merge(routes::blocks::routes(self.database.clone()))
                    .merge(routes::transactions::routes(self.database.clone()))
                    .merge(routes::stats::routes(self.database.clone())),
            )
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    pub async fn start(&self) -> Result<()> {
        let app = self.router();
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("API server listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::ExplorerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}
