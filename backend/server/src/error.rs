use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to persist ledger: {0}")]
    Persist(#[from] std::io::Error),

    #[error("Failed to encode ledger: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error!("{self}");

        (status, self.to_string()).into_response()
    }
}
