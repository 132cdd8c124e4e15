use super::utils::null_mask;
use crate::error::AppError;
use crate::models::{MissingEntry, MissingTable};
use polars::prelude::*;

/// Null counts and shares for every column. Zero-row frames produce an empty table.
pub fn missing_table(df: &DataFrame) -> Result<MissingTable, AppError> {
    let n_rows = df.height();
    if n_rows == 0 {
        return Ok(MissingTable::default());
    }

    let entries = df
        .get_columns()
        .iter()
        .map(|series| {
            let missing_count = null_mask(series)?.into_iter().filter(|m| *m).count();
            Ok(MissingEntry {
                column: series.name().to_string(),
                missing_count,
                missing_share: missing_count as f64 / n_rows as f64,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(MissingTable { entries })
}
