use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("DataFrame error: {0}")]
    DataFrameError(String),

    #[error("Chart error: {0}")]
    ChartError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ParseError(_) => StatusCode::BAD_REQUEST,
            AppError::EmptyDataset => StatusCode::BAD_REQUEST,
            AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DataFrameError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ChartError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<polars::error::PolarsError> for AppError {
    fn from(err: polars::error::PolarsError) -> Self {
        AppError::DataFrameError(err.to_string())
    }
}

impl<E> From<DrawingAreaErrorKind<E>> for AppError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        AppError::ChartError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
