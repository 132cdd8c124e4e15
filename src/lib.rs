//! Exploratory data analysis for CSV datasets.
//!
//! The statistical core lives in [`services::eda`]: column summaries,
//! missing-value accounting, Pearson correlation, categorical top-k and the
//! quality heuristics. It is exposed through the `eda-cli` binary
//! ([`commands`]), the report bundle writer ([`services::report`]) and an
//! HTTP API ([`routes`]).

use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        Self { config }
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .merge(routes::routes())
        .merge(routes::quality::routes())
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
