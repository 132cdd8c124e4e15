use super::plots;
use super::utils::{clean_file_stem, format_share};
use crate::config::QualityThresholds;
use crate::error::AppError;
use crate::models::{
    CorrelationMatrix, DatasetSummary, FlagSet, JsonSummary, MissingTable, QualityFlags, TopCategories,
};
use crate::services::eda::{self, utils::{float_values, is_numeric_series, null_mask}};
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub out_dir: PathBuf,
    pub title: String,
    pub max_hist_columns: usize,
    pub top_k_categories: usize,
    pub max_categorical_columns: usize,
    pub min_missing_share: f64,
    pub json_summary: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("reports"),
            title: "EDA Report".to_string(),
            max_hist_columns: 6,
            top_k_categories: eda::DEFAULT_TOP_K,
            max_categorical_columns: 5,
            min_missing_share: 0.1,
            json_summary: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportArtifacts {
    pub out_dir: PathBuf,
    pub report_md: PathBuf,
    pub summary_csv: PathBuf,
    pub missing_csv: Option<PathBuf>,
    pub correlation_csv: Option<PathBuf>,
    pub top_category_files: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

struct Analysis {
    summary: DatasetSummary,
    missing: MissingTable,
    correlation: CorrelationMatrix,
    top_categories: TopCategories,
    flags: QualityFlags,
    problematic_missing: Vec<String>,
    problematic: Vec<String>,
}

/// Writes the full report bundle for `df` into `options.out_dir`.
pub fn generate_report(
    df: &DataFrame,
    source_name: &str,
    options: &ReportOptions,
    thresholds: &QualityThresholds,
) -> Result<ReportArtifacts, AppError> {
    if !(0.0..=1.0).contains(&options.min_missing_share) {
        return Err(AppError::InvalidInput("min_missing_share must be within [0, 1]".to_string()));
    }

    let start = std::time::Instant::now();
    let out_root = options.out_dir.as_path();
    fs::create_dir_all(out_root)?;
    tracing::info!("Generating report for {} into {}", source_name, out_root.display());

    let summary = eda::summarize_dataset(df)?;
    let missing = eda::missing_table(df)?;
    let correlation = eda::correlation_matrix(df)?;
    let top_categories = eda::top_categories(df, options.top_k_categories, Some(options.max_categorical_columns))?;
    let flags = eda::compute_quality_flags(&summary, &missing, thresholds);
    let problematic_missing = eda::missing_columns_over(&missing, options.min_missing_share);
    let problematic = eda::problematic_columns(&summary, &missing, options.min_missing_share, thresholds);

    let analysis = Analysis {
        summary,
        missing,
        correlation,
        top_categories,
        flags,
        problematic_missing,
        problematic,
    };

    let mut artifacts = ReportArtifacts {
        out_dir: out_root.to_path_buf(),
        ..ReportArtifacts::default()
    };

    // Tables
    artifacts.summary_csv = out_root.join("summary.csv");
    let mut summary_frame = eda::flatten_summary_for_print(&analysis.summary)?;
    write_frame(&mut summary_frame, &artifacts.summary_csv)?;

    if !analysis.missing.is_empty() {
        let path = out_root.join("missing.csv");
        write_frame(&mut missing_frame(&analysis.missing)?, &path)?;
        artifacts.missing_csv = Some(path);
    }

    if !analysis.correlation.is_empty() {
        let path = out_root.join("correlation.csv");
        write_frame(&mut correlation_frame(&analysis.correlation)?, &path)?;
        artifacts.correlation_csv = Some(path);
    }

    artifacts.top_category_files = write_top_categories(&analysis.top_categories, &out_root.join("top_categories"))?;

    if options.json_summary {
        let path = out_root.join("summary.json");
        let json = json_summary(&analysis);
        fs::write(&path, serde_json::to_string_pretty(&json)?)?;
        artifacts.summary_json = Some(path);
    }

    // Markdown
    artifacts.report_md = out_root.join("report.md");
    let markdown = render_markdown(&analysis, source_name, options)
        .map_err(|e| AppError::Internal(format!("Failed to render markdown: {}", e)))?;
    fs::write(&artifacts.report_md, markdown)?;

    // Images
    artifacts.images = write_plots(df, &analysis, out_root, options)?;

    tracing::info!(
        "Report written to {} in {:?} ({} images)",
        out_root.display(),
        start.elapsed(),
        artifacts.images.len()
    );
    Ok(artifacts)
}

fn write_frame(df: &mut DataFrame, path: &Path) -> Result<(), AppError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

fn missing_frame(missing: &MissingTable) -> Result<DataFrame, AppError> {
    let frame = DataFrame::new(vec![
        Series::new("column", missing.entries.iter().map(|e| e.column.clone()).collect::<Vec<_>>()),
        Series::new("missing_count", missing.entries.iter().map(|e| e.missing_count as u64).collect::<Vec<_>>()),
        Series::new("missing_share", missing.entries.iter().map(|e| e.missing_share).collect::<Vec<_>>()),
    ])?;
    Ok(frame)
}

fn correlation_frame(matrix: &CorrelationMatrix) -> Result<DataFrame, AppError> {
    // Label header must not collide with a data column name
    let mut label = String::from("column");
    while matrix.columns.contains(&label) {
        label.push('_');
    }
    let mut columns = vec![Series::new(&label, matrix.columns.clone())];
    for (j, name) in matrix.columns.iter().enumerate() {
        let values: Vec<Option<f64>> = matrix.values.iter().map(|row| row[j]).collect();
        columns.push(Series::new(name, values));
    }
    Ok(DataFrame::new(columns)?)
}

fn write_top_categories(top: &TopCategories, dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)?;
    let mut existing_names = HashSet::new();
    let mut written = Vec::with_capacity(top.tables.len());

    for table in &top.tables {
        let stem = clean_file_stem(&table.column, &mut existing_names);
        let path = dir.join(format!("{}.csv", stem));
        let mut frame = DataFrame::new(vec![
            Series::new("value", table.entries.iter().map(|e| e.value.clone()).collect::<Vec<_>>()),
            Series::new("count", table.entries.iter().map(|e| e.count as u64).collect::<Vec<_>>()),
        ])?;
        write_frame(&mut frame, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn json_summary(analysis: &Analysis) -> JsonSummary {
    JsonSummary {
        n_rows: analysis.summary.n_rows,
        n_cols: analysis.summary.n_cols,
        quality_score: (analysis.flags.quality_score * 10_000.0).round() / 10_000.0,
        problematic_columns: analysis.problematic.clone(),
        flags: FlagSet::from(&analysis.flags),
    }
}

fn render_markdown(
    analysis: &Analysis,
    source_name: &str,
    options: &ReportOptions,
) -> Result<String, std::fmt::Error> {
    let flags = &analysis.flags;
    let mut md = String::new();

    writeln!(md, "# {}\n", options.title)?;
    writeln!(md, "Source file: `{}`\n", source_name)?;
    writeln!(
        md,
        "Rows: **{}**, columns: **{}**\n",
        analysis.summary.n_rows, analysis.summary.n_cols
    )?;
    writeln!(md, "Generated at: {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;

    writeln!(md, "## Data quality (heuristics)\n")?;
    writeln!(md, "- Quality score: **{:.2}**", flags.quality_score)?;
    writeln!(md, "- Max missing share per column: **{}**", format_share(flags.max_missing_share))?;
    writeln!(md, "- Too few rows: **{}**", flags.too_few_rows)?;
    writeln!(md, "- Too many columns: **{}**", flags.too_many_columns)?;
    writeln!(md, "- Too many missing values: **{}**", flags.too_many_missing)?;
    writeln!(md, "- Constant columns: **{}**", flags.has_constant_columns)?;
    writeln!(md, "- High-cardinality categoricals: **{}**", flags.has_high_cardinality_categoricals)?;
    writeln!(md, "- Low-variation numeric columns: **{}**", flags.has_numeric_columns_with_low_variation)?;
    writeln!(md, "- Missing share threshold for problematic columns: **{}**", format_share(options.min_missing_share))?;
    if analysis.problematic_missing.is_empty() {
        writeln!(md, "- No columns exceed the missing share threshold.")?;
    } else {
        writeln!(md, "- Problematic columns by missing values: `{}`", analysis.problematic_missing.join(", "))?;
    }
    writeln!(md)?;

    writeln!(md, "## Columns\n")?;
    writeln!(md, "See `summary.csv`.\n")?;

    writeln!(md, "## Missing values\n")?;
    if analysis.missing.is_empty() {
        writeln!(md, "No missing values table: the dataset is empty.\n")?;
    } else {
        writeln!(md, "See `missing.csv` and `missing_matrix.svg`.")?;
        writeln!(
            md,
            "- Threshold used for problematic columns: **{}**\n",
            format_share(options.min_missing_share)
        )?;
    }

    writeln!(md, "## Numeric correlation\n")?;
    if analysis.correlation.is_empty() {
        writeln!(md, "Not enough numeric columns for correlation.\n")?;
    } else {
        writeln!(md, "See `correlation.csv` and `correlation_heatmap.svg`.\n")?;
    }

    writeln!(md, "## Categorical features\n")?;
    if analysis.top_categories.is_empty() {
        writeln!(md, "No categorical or string columns found.\n")?;
    } else {
        writeln!(md, "- Top-{} values per categorical column.", options.top_k_categories)?;
        writeln!(md, "See the files in `top_categories/`.\n")?;
        writeln!(md, "- Category distribution charts: `bar_*.svg`.\n")?;
    }

    writeln!(md, "## Numeric histograms\n")?;
    writeln!(md, "- At most **{}** histograms for numeric columns.", options.max_hist_columns)?;
    writeln!(md, "See `hist_*.svg`.")?;

    Ok(md)
}

fn write_plots(
    df: &DataFrame,
    analysis: &Analysis,
    out_root: &Path,
    options: &ReportOptions,
) -> Result<Vec<PathBuf>, AppError> {
    let mut images = Vec::new();
    let mut existing_names = HashSet::new();

    for series in df
        .get_columns()
        .iter()
        .filter(|s| is_numeric_series(s))
        .take(options.max_hist_columns)
    {
        let values: Vec<f64> = float_values(series)?.into_iter().flatten().collect();
        let stem = clean_file_stem(series.name(), &mut existing_names);
        let path = out_root.join(format!("hist_{}.svg", stem));
        fs::write(&path, plots::histogram(series.name(), &values, plots::HISTOGRAM_BINS)?)?;
        images.push(path);
    }

    let mut existing_names = HashSet::new();
    for table in &analysis.top_categories.tables {
        let stem = clean_file_stem(&table.column, &mut existing_names);
        let path = out_root.join(format!("bar_{}.svg", stem));
        fs::write(&path, plots::category_bars(table)?)?;
        images.push(path);
    }

    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let masks = df
        .get_columns()
        .iter()
        .map(null_mask)
        .collect::<PolarsResult<Vec<_>>>()?;
    let path = out_root.join("missing_matrix.svg");
    fs::write(&path, plots::missing_matrix(&names, &masks, df.height())?)?;
    images.push(path);

    if !analysis.correlation.is_empty() {
        let path = out_root.join("correlation_heatmap.svg");
        fs::write(&path, plots::correlation_heatmap(&analysis.correlation)?)?;
        images.push(path);
    }

    Ok(images)
}
