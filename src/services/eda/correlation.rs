use super::utils::{float_values, is_numeric_series};
use crate::error::AppError;
use crate::models::CorrelationMatrix;
use polars::prelude::cov::pearson_corr;
use polars::prelude::*;

/// Pairwise Pearson correlation across numeric columns, dropping incomplete
/// pairs per column pair. Fewer than two numeric columns yield an empty matrix.
pub fn correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix, AppError> {
    let mut columns = Vec::new();
    let mut data = Vec::new();
    for series in df.get_columns().iter().filter(|s| is_numeric_series(s)) {
        columns.push(series.name().to_string());
        data.push(float_values(series)?);
    }

    if columns.len() < 2 {
        tracing::debug!("Skipping correlation: {} numeric column(s)", columns.len());
        return Ok(CorrelationMatrix::default());
    }

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let r = pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix { columns, values })
}

/// Coefficient over the rows where both columns are present. Fewer than two
/// such rows, or a zero-variance side, leave the pair undefined.
fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let complete = a.iter().zip(b).filter(|(x, y)| x.is_some() && y.is_some()).count();
    if complete < 2 {
        return None;
    }

    let x: Float64Chunked = a.iter().copied().collect();
    let y: Float64Chunked = b.iter().copied().collect();
    pearson_corr(&x, &y, 1)
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(-1.0, 1.0))
}
