use super::utils::{
    count_distinct_floats, float_values, is_numeric_series, mean, min_max, null_mask, sample_std, text_values,
};
use crate::error::AppError;
use crate::models::{ColumnSummary, DatasetSummary};
use polars::prelude::*;
use std::collections::HashSet;

pub fn summarize_dataset(df: &DataFrame) -> Result<DatasetSummary, AppError> {
    let n_rows = df.height();
    tracing::debug!("Summarizing dataset: {} rows x {} columns", n_rows, df.width());

    let columns = df
        .get_columns()
        .iter()
        .map(|series| summarize_column(series, n_rows))
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(DatasetSummary {
        n_rows,
        n_cols: df.width(),
        columns,
    })
}

fn summarize_column(series: &Series, n_rows: usize) -> Result<ColumnSummary, AppError> {
    let is_numeric = is_numeric_series(series);
    let missing = null_mask(series)?.into_iter().filter(|m| *m).count();
    let non_null = n_rows - missing;
    let missing_share = if n_rows > 0 {
        missing as f64 / n_rows as f64
    } else {
        0.0
    };

    let mut summary = ColumnSummary {
        name: series.name().to_string(),
        dtype: series.dtype().to_string(),
        non_null,
        missing,
        missing_share,
        unique: 0,
        is_numeric,
        min: None,
        max: None,
        mean: None,
        std: None,
    };

    if is_numeric {
        let values: Vec<f64> = float_values(series)?.into_iter().flatten().collect();
        let (min, max) = min_max(&values);
        summary.unique = count_distinct_floats(&values);
        summary.min = min;
        summary.max = max;
        summary.mean = mean(&values);
        summary.std = sample_std(&values);
    } else {
        summary.unique = text_values(series)?
            .into_iter()
            .flatten()
            .collect::<HashSet<String>>()
            .len();
    }

    Ok(summary)
}

/// Tabular view of the summary, one row per column, for printing and CSV export.
pub fn flatten_summary_for_print(summary: &DatasetSummary) -> Result<DataFrame, AppError> {
    let cols = &summary.columns;
    let frame = DataFrame::new(vec![
        Series::new("name", cols.iter().map(|c| c.name.clone()).collect::<Vec<_>>()),
        Series::new("dtype", cols.iter().map(|c| c.dtype.clone()).collect::<Vec<_>>()),
        Series::new("non_null", cols.iter().map(|c| c.non_null as u64).collect::<Vec<_>>()),
        Series::new("missing", cols.iter().map(|c| c.missing as u64).collect::<Vec<_>>()),
        Series::new("missing_share", cols.iter().map(|c| c.missing_share).collect::<Vec<_>>()),
        Series::new("unique", cols.iter().map(|c| c.unique as u64).collect::<Vec<_>>()),
        Series::new("is_numeric", cols.iter().map(|c| c.is_numeric).collect::<Vec<_>>()),
        Series::new("min", cols.iter().map(|c| c.min).collect::<Vec<_>>()),
        Series::new("max", cols.iter().map(|c| c.max).collect::<Vec<_>>()),
        Series::new("mean", cols.iter().map(|c| c.mean).collect::<Vec<_>>()),
        Series::new("std", cols.iter().map(|c| c.std).collect::<Vec<_>>()),
    ])?;
    Ok(frame)
}
