use serde::Deserialize;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::str::FromStr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

/// Thresholds driving the dataset quality heuristics.
#[derive(Debug, Clone, Deserialize)]
pub struct QualityThresholds {
    /// Datasets with fewer rows are flagged as too small.
    pub min_rows: usize,
    /// Datasets with more columns are flagged as too wide.
    pub max_columns: usize,
    /// Ceiling on the largest per-column missing share.
    pub max_missing_share: f64,
    pub detect_constant_columns: bool,
    /// Non-numeric columns with more distinct values are high-cardinality.
    pub high_cardinality_uniques: usize,
    /// Numeric columns whose sample std falls below this are low-variation.
    pub low_variation_std: f64,
    /// Amount subtracted from the score for every triggered flag.
    pub flag_penalty: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_rows: 100,
            max_columns: 100,
            max_missing_share: 0.5,
            detect_constant_columns: true,
            high_cardinality_uniques: 50,
            low_variation_std: 1e-6,
            flag_penalty: 1.0 / 6.0,
        }
    }
}

impl QualityThresholds {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.max_missing_share) {
            anyhow::bail!("EDA_MAX_MISSING_SHARE must be within [0, 1], got {}", self.max_missing_share);
        }
        if !(0.0..=1.0).contains(&self.flag_penalty) {
            anyhow::bail!("EDA_FLAG_PENALTY must be within [0, 1], got {}", self.flag_penalty);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    pub thresholds: QualityThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_file_size: default_max_file_size(),
            thresholds: QualityThresholds::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let defaults = Config::default();
        let thresholds = QualityThresholds {
            min_rows: env_or("EDA_MIN_ROWS", defaults.thresholds.min_rows)?,
            max_columns: env_or("EDA_MAX_COLUMNS", defaults.thresholds.max_columns)?,
            max_missing_share: env_or("EDA_MAX_MISSING_SHARE", defaults.thresholds.max_missing_share)?,
            flag_penalty: env_or("EDA_FLAG_PENALTY", defaults.thresholds.flag_penalty)?,
            ..defaults.thresholds
        };

        thresholds.validate()?;

        Ok(Config {
            host: env_or("EDA_HOST", defaults.host)?,
            port: env_or("EDA_PORT", defaults.port)?,
            max_file_size: env_or("EDA_MAX_FILE_SIZE", defaults.max_file_size)?,
            thresholds,
        })
    }
}

pub fn load_config() -> Result<Config> {
    let config = Config::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_weigh_six_flags_equally() {
        let thresholds = QualityThresholds::default();
        assert_eq!(thresholds.high_cardinality_uniques, 50);
        assert!((thresholds.flag_penalty * 6.0 - 1.0).abs() < 1e-12);
        assert!(thresholds.detect_constant_columns);
    }

    #[test]
    fn env_or_falls_back_when_unset() {
        let value: usize = env_or("EDA_TEST_SURELY_UNSET_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn env_or_reports_unparseable_values() {
        std::env::set_var("EDA_TEST_UNPARSEABLE_PORT", "abc");
        let err = env_or::<u16>("EDA_TEST_UNPARSEABLE_PORT", 8000).unwrap_err();
        assert!(err.to_string().contains("EDA_TEST_UNPARSEABLE_PORT"));
        std::env::remove_var("EDA_TEST_UNPARSEABLE_PORT");
    }

    #[test]
    fn env_or_parses_trimmed_values() {
        std::env::set_var("EDA_TEST_TRIMMED_ROWS", " 250 ");
        let value: usize = env_or("EDA_TEST_TRIMMED_ROWS", 100).unwrap();
        assert_eq!(value, 250);
        std::env::remove_var("EDA_TEST_TRIMMED_ROWS");
    }

    #[test]
    fn thresholds_outside_unit_range_are_rejected() {
        assert!(QualityThresholds::default().validate().is_ok());

        let share = QualityThresholds {
            max_missing_share: 1.5,
            ..QualityThresholds::default()
        };
        let err = share.validate().unwrap_err();
        assert!(err.to_string().contains("EDA_MAX_MISSING_SHARE"));

        let penalty = QualityThresholds {
            flag_penalty: -0.1,
            ..QualityThresholds::default()
        };
        assert!(penalty.validate().is_err());
    }
}
