use super::utils::{is_numeric_series, text_values};
use crate::error::AppError;
use crate::models::{CategoryCount, CategoryTable, TopCategories};
use polars::prelude::*;
use std::collections::HashMap;

pub const DEFAULT_TOP_K: usize = 5;

/// Most frequent values of each non-numeric column, highest count first.
/// Ties keep the order in which values first appear. Columns without any
/// non-null value are skipped and do not count toward `max_columns`.
pub fn top_categories(
    df: &DataFrame,
    top_k: usize,
    max_columns: Option<usize>,
) -> Result<TopCategories, AppError> {
    if top_k == 0 {
        return Err(AppError::InvalidInput("top_k must be a positive integer".to_string()));
    }

    let mut tables = Vec::new();
    for series in df.get_columns().iter().filter(|s| !is_numeric_series(s)) {
        if max_columns.is_some_and(|cap| tables.len() >= cap) {
            break;
        }

        let entries = count_values(text_values(series)?.into_iter().flatten(), top_k);
        if entries.is_empty() {
            continue;
        }
        tables.push(CategoryTable {
            column: series.name().to_string(),
            entries,
        });
    }

    Ok(TopCategories { tables })
}

fn count_values(values: impl Iterator<Item = String>, top_k: usize) -> Vec<CategoryCount> {
    // value -> (count, first position)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (idx, value) in values.enumerate() {
        counts.entry(value).or_insert((0, idx)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(value, (count, first))| (value, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(top_k)
        .map(|(value, count, _)| CategoryCount { value, count })
        .collect()
}
