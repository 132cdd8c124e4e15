use anyhow::Result;
use clap::{Parser, Subcommand};
use eda_services::{
    commands,
    config,
    logging,
    services::{loader::CsvOptions, report::ReportOptions},
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "eda-cli",
    version,
    about = "Mini CLI for exploratory analysis of CSV files",
    long_about = "Summaries, data-quality heuristics and report bundles for CSV datasets.\n\n\
                  EXAMPLES:\n  \
                  eda-cli overview data.csv\n  \
                  eda-cli report data.csv --out-dir reports --json-summary\n  \
                  eda-cli serve --port 8000"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print dataset dimensions and a per-column summary table
    Overview {
        /// Path to the CSV file
        path: PathBuf,

        /// CSV separator
        #[arg(long, default_value = ",")]
        sep: String,

        /// File encoding label (utf-8, latin-1, cp1251, ...); append -lossy to replace invalid bytes
        #[arg(long, default_value = "utf-8")]
        encoding: String,
    },

    /// Generate the full EDA report bundle
    Report {
        /// Path to the CSV file
        path: PathBuf,

        /// Output directory for the report
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,

        /// CSV separator
        #[arg(long, default_value = ",")]
        sep: String,

        /// File encoding label (utf-8, latin-1, cp1251, ...); append -lossy to replace invalid bytes
        #[arg(long, default_value = "utf-8")]
        encoding: String,

        /// Maximum number of numeric columns to draw histograms for
        #[arg(long, default_value = "6")]
        max_hist_columns: usize,

        /// Number of top values reported per categorical column
        #[arg(long, default_value = "5", value_parser = parse_positive)]
        top_k_categories: usize,

        /// Maximum number of categorical columns analysed
        #[arg(long, default_value = "5")]
        max_cat_columns: usize,

        /// Title of report.md
        #[arg(long, default_value = "EDA Report")]
        title: String,

        /// Missing share (0.0 - 1.0) at or above which a column is problematic
        #[arg(long, default_value = "0.1", value_parser = parse_share)]
        min_missing_share: f64,

        /// Also write summary.json with a compact overview
        #[arg(long)]
        json_summary: bool,
    },

    /// Run the HTTP API
    Serve {
        /// Bind address, defaults to EDA_HOST or 127.0.0.1
        #[arg(long)]
        host: Option<String>,

        /// Port, defaults to EDA_PORT or 8000
        #[arg(long)]
        port: Option<u16>,
    },
}

fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(v) => Ok(v),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_share(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is not within [0.0, 1.0]", value))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    logging::init_logging(&cli.log_level)?;

    // Load configuration
    let mut config = config::load_config()?;

    match cli.command {
        Command::Overview { path, sep, encoding } => {
            // Show every summary row and column
            std::env::set_var("POLARS_FMT_MAX_COLS", "-1");
            std::env::set_var("POLARS_FMT_MAX_ROWS", "-1");

            let csv = CsvOptions::from_args(&sep, &encoding)?;
            println!("{}", commands::overview(&path, &csv)?);
        }
        Command::Report {
            path,
            out_dir,
            sep,
            encoding,
            max_hist_columns,
            top_k_categories,
            max_cat_columns,
            title,
            min_missing_share,
            json_summary,
        } => {
            let csv = CsvOptions::from_args(&sep, &encoding)?;
            let options = ReportOptions {
                out_dir,
                title,
                max_hist_columns,
                top_k_categories,
                max_categorical_columns: max_cat_columns,
                min_missing_share,
                json_summary,
            };
            let artifacts = commands::report(&path, &csv, &options, &config.thresholds)?;
            println!("{}", commands::describe_artifacts(&artifacts));
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            commands::serve(config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn report_defaults() {
        let cli = Cli::try_parse_from(["eda-cli", "report", "data.csv"]).unwrap();
        match cli.command {
            Command::Report { out_dir, top_k_categories, min_missing_share, json_summary, .. } => {
                assert_eq!(out_dir, PathBuf::from("reports"));
                assert_eq!(top_k_categories, 5);
                assert_eq!(min_missing_share, 0.1);
                assert!(!json_summary);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_out_of_range_share_and_zero_top_k() {
        assert!(Cli::try_parse_from(["eda-cli", "report", "d.csv", "--min-missing-share", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["eda-cli", "report", "d.csv", "--top-k-categories", "0"]).is_err());
    }
}
