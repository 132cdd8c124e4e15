use crate::config::{Config, QualityThresholds};
use crate::error::AppError;
use crate::services::eda;
use crate::services::loader::{self, CsvOptions};
use crate::services::report::{self, ReportArtifacts, ReportOptions};
use crate::{build_app, AppState};
use std::path::Path;
use std::sync::Arc;

/// Row/column counts followed by the per-column summary table.
pub fn overview(path: &Path, csv: &CsvOptions) -> Result<String, AppError> {
    let df = loader::load_csv(path, csv)?;
    loader::ensure_not_empty(&df)?;

    let summary = eda::summarize_dataset(&df)?;
    let table = eda::flatten_summary_for_print(&summary)?;

    Ok(format!(
        "Rows: {}\nColumns: {}\n\nColumns:\n{}",
        summary.n_rows, summary.n_cols, table
    ))
}

pub fn report(
    path: &Path,
    csv: &CsvOptions,
    options: &ReportOptions,
    thresholds: &QualityThresholds,
) -> Result<ReportArtifacts, AppError> {
    let df = loader::load_csv(path, csv)?;
    loader::ensure_not_empty(&df)?;

    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    report::generate_report(&df, &source_name, options, thresholds)
}

pub fn describe_artifacts(artifacts: &ReportArtifacts) -> String {
    let mut lines = vec![
        format!("Report generated in: {}", artifacts.out_dir.display()),
        format!("- Markdown: {}", artifacts.report_md.display()),
        "- Tables: summary.csv, missing.csv, correlation.csv, top_categories/*.csv".to_string(),
        "- Charts: hist_*.svg, bar_*.svg, missing_matrix.svg, correlation_heatmap.svg".to_string(),
    ];
    if let Some(json) = &artifacts.summary_json {
        lines.push(format!("- JSON summary: {}", json.display()));
    }
    lines.join("\n")
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config));
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
