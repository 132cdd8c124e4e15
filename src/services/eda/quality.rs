use crate::config::QualityThresholds;
use crate::models::{ColumnSummary, DatasetSummary, MissingTable, QualityFlags};
use std::collections::BTreeSet;

/// Evaluates every heuristic independently and derives the score from the
/// number of flags raised.
pub fn compute_quality_flags(
    summary: &DatasetSummary,
    missing: &MissingTable,
    thresholds: &QualityThresholds,
) -> QualityFlags {
    let max_missing_share = missing.max_share();

    let mut flags = QualityFlags {
        quality_score: 1.0,
        max_missing_share,
        too_few_rows: summary.n_rows < thresholds.min_rows,
        too_many_columns: summary.n_cols > thresholds.max_columns,
        too_many_missing: max_missing_share > thresholds.max_missing_share,
        has_constant_columns: thresholds.detect_constant_columns
            && summary.columns.iter().any(is_constant),
        has_high_cardinality_categoricals: summary
            .columns
            .iter()
            .any(|c| is_high_cardinality(c, thresholds)),
        has_numeric_columns_with_low_variation: summary
            .columns
            .iter()
            .any(|c| is_low_variation(c, thresholds)),
    };

    let penalty = thresholds.flag_penalty * flags.triggered() as f64;
    flags.quality_score = (1.0 - penalty).clamp(0.0, 1.0);

    tracing::debug!(
        "Quality score {:.3} with {} flag(s) raised",
        flags.quality_score,
        flags.triggered()
    );
    flags
}

fn is_constant(column: &ColumnSummary) -> bool {
    column.non_null > 0 && column.unique == 1
}

fn is_high_cardinality(column: &ColumnSummary, thresholds: &QualityThresholds) -> bool {
    !column.is_numeric && column.non_null > 0 && column.unique > thresholds.high_cardinality_uniques
}

fn is_low_variation(column: &ColumnSummary, thresholds: &QualityThresholds) -> bool {
    column.is_numeric
        && column.non_null > 1
        && column.std.is_some_and(|std| std < thresholds.low_variation_std)
}

/// Columns whose missing share reaches `min_missing_share`, in column order.
pub fn missing_columns_over(missing: &MissingTable, min_missing_share: f64) -> Vec<String> {
    missing
        .entries
        .iter()
        .filter(|e| e.missing_share >= min_missing_share)
        .map(|e| e.column.clone())
        .collect()
}

/// Sorted union of columns tripping any per-column heuristic.
pub fn problematic_columns(
    summary: &DatasetSummary,
    missing: &MissingTable,
    min_missing_share: f64,
    thresholds: &QualityThresholds,
) -> Vec<String> {
    let mut columns: BTreeSet<String> = missing_columns_over(missing, min_missing_share)
        .into_iter()
        .collect();

    for column in &summary.columns {
        let constant = thresholds.detect_constant_columns && is_constant(column);
        if constant || is_high_cardinality(column, thresholds) || is_low_variation(column, thresholds) {
            columns.insert(column.name.clone());
        }
    }

    columns.into_iter().collect()
}
