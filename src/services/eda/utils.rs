use polars::prelude::*;
use std::collections::HashSet;

/// Integer and float dtypes are numeric. Booleans, strings and everything
/// else are treated as categorical.
pub fn is_numeric_series(series: &Series) -> bool {
    series.dtype().is_numeric()
}

/// Numeric cells as `f64`, with NaN folded into null.
pub fn float_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Cells rendered as strings, nulls preserved.
pub fn text_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// Null mask shared by the summarizer and missing-value analyzer.
pub fn null_mask(series: &Series) -> PolarsResult<Vec<bool>> {
    if is_numeric_series(series) {
        Ok(float_values(series)?.iter().map(|v| v.is_none()).collect())
    } else {
        let mask = series.is_null();
        Ok((&mask).into_iter().map(|v| v.unwrap_or(true)).collect())
    }
}

pub fn count_distinct_floats(values: &[f64]) -> usize {
    values
        .iter()
        // -0.0 and 0.0 compare equal, keep them in one bucket
        .map(|v| if *v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
        .collect::<HashSet<u64>>()
        .len()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

pub fn min_max(values: &[f64]) -> (Option<f64>, Option<f64>) {
    values.iter().fold((None, None), |(min, max), &v| {
        (
            Some(min.map_or(v, |m: f64| m.min(v))),
            Some(max.map_or(v, |m: f64| m.max(v))),
        )
    })
}
