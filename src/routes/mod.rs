use axum::{routing::get, Json, Router};
use std::sync::Arc;

use crate::{models::HealthResponse, AppState};

pub mod quality;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "EDA API is running",
    })
}
