//! Error types for the explorer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ExplorerError>;

impl IntoResponse for ExplorerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ExplorerError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            ExplorerError::Http(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Upstream error"),
            ExplorerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO error"),
            ExplorerError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            ExplorerError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
            ExplorerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
