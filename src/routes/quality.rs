use axum::{
    extract::{Multipart, State},
    routing::post,
    Router,
    Json,
    http::Method,
};
use bytes::Bytes;
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    models::QualityFlags,
    services::{
        eda,
        loader::{self, CsvOptions},
    },
};
use tower_http::cors::{CorsLayer, Any};

const ALLOWED_EXTENSIONS: [&str; 2] = [".csv", ".txt"];

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/quality", post(quality_from_columns))
        .route("/quality-from-csv", post(quality_from_csv))
        .layer(cors)
}

/// Accepts `{"columns": {"col": [...]}}`. The body is parsed by hand so that
/// every malformed payload maps to a 400.
async fn quality_from_columns(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<QualityFlags>, AppError> {
    tracing::info!("Received /quality request, {} bytes", body.len());

    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid input data: {}", e)))?;
    let df = loader::frame_from_json_columns(&payload)?;
    loader::ensure_not_empty(&df)?;

    let flags = eda::assess_quality(&df, &state.config.thresholds)?;
    Ok(Json(flags))
}

async fn quality_from_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<QualityFlags>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload
        .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    tracing::info!("Received /quality-from-csv upload {:?}, {}KB", file_name, data.len() / 1024);

    if !ALLOWED_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
        return Err(AppError::InvalidInput("Only CSV files are allowed".to_string()));
    }

    let df = loader::load_csv_bytes(data, &CsvOptions::default())?;
    loader::ensure_not_empty(&df)?;

    let flags = eda::assess_quality(&df, &state.config.thresholds)?;
    Ok(Json(flags))
}
