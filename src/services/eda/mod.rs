pub mod categorical;
pub mod correlation;
pub mod missing;
pub mod quality;
pub mod summary;
pub mod utils;

pub use categorical::{top_categories, DEFAULT_TOP_K};
pub use correlation::correlation_matrix;
pub use missing::missing_table;
pub use quality::{compute_quality_flags, missing_columns_over, problematic_columns};
pub use summary::{flatten_summary_for_print, summarize_dataset};

use crate::config::QualityThresholds;
use crate::error::AppError;
use crate::models::QualityFlags;
use polars::prelude::DataFrame;

/// Summary, missing-value table and quality flags for one dataset.
pub fn assess_quality(df: &DataFrame, thresholds: &QualityThresholds) -> Result<QualityFlags, AppError> {
    let start = std::time::Instant::now();
    let summary = summarize_dataset(df)?;
    let missing = missing_table(df)?;
    let flags = compute_quality_flags(&summary, &missing, thresholds);
    tracing::info!(
        "Assessed {} rows x {} columns in {:?}: score {:.3}",
        summary.n_rows,
        summary.n_cols,
        start.elapsed(),
        flags.quality_score
    );
    Ok(flags)
}
