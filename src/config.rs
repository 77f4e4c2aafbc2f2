//! Application configuration.
//!
//! Layered from built-in defaults, an optional `f1dash.toml` and
//! `F1DASH__SECTION__KEY` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{validate_learning_rate, validate_test_fraction, DashboardError, ModelError};

/// Source data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    /// Marker written for missing values in the CSV files
    #[serde(default = "default_null_marker")]
    pub null_marker: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_null_marker() -> String {
    "\\N".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            null_marker: default_null_marker(),
        }
    }
}

/// What to do with a result that has no constructor standing for its race
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStandingPolicy {
    /// Inner-join semantics: the result is excluded
    #[default]
    Drop,
    /// Keep the result with zero constructor points
    ZeroPoints,
}

/// Join configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinConfig {
    #[serde(default)]
    pub missing_standing: MissingStandingPolicy,
}

/// What to do with a result row that lacks one of the model features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    #[default]
    Drop,
    /// Replace with the column mean of the present values
    Impute,
    Error,
}

/// Feature extraction configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub missing_values: MissingValuePolicy,
}

/// Regression model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Below this many training rows the mean predictor is used instead
    #[serde(default = "default_min_train_samples")]
    pub min_train_samples: usize,
}

fn default_n_estimators() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_depth() -> usize {
    3
}

fn default_test_fraction() -> f64 {
    0.3
}

fn default_seed() -> u64 {
    42
}

fn default_min_train_samples() -> usize {
    10
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            test_fraction: default_test_fraction(),
            seed: default_seed(),
            min_train_samples: default_min_train_samples(),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_test_fraction(self.test_fraction)?;
        validate_learning_rate(self.learning_rate)?;
        if self.max_depth == 0 {
            return Err(ModelError::InvalidConfig(
                "Max depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default inputs for the race outcome prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default = "default_grid")]
    pub grid: u32,
    #[serde(default = "default_laps")]
    pub laps: u32,
    #[serde(default = "default_constructor_points")]
    pub constructor_points: f64,
}

fn default_year() -> i32 {
    2023
}

fn default_grid() -> u32 {
    10
}

fn default_laps() -> u32 {
    60
}

fn default_constructor_points() -> f64 {
    25.0
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            grid: default_grid(),
            laps: default_laps(),
            constructor_points: default_constructor_points(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub join: JoinConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
}

impl AppConfig {
    /// Load configuration from defaults, config file and environment
    ///
    /// Without an explicit path, `f1dash.toml` in the working directory is
    /// used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, DashboardError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("f1dash").required(false),
        };

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            // F1DASH__MODEL__N_ESTIMATORS, F1DASH__JOIN__MISSING_STANDING, ...
            .add_source(
                config::Environment::with_prefix("F1DASH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = config.try_deserialize()?;
        app.model.validate()?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert_eq!(config.data.null_marker, "\\N");
        assert_eq!(config.join.missing_standing, MissingStandingPolicy::Drop);
        assert_eq!(config.features.missing_values, MissingValuePolicy::Drop);
        assert_eq!(config.model.n_estimators, 100);
        assert_eq!(config.model.seed, 42);
        assert!((config.model.test_fraction - 0.3).abs() < 1e-9);
        assert_eq!(config.prediction.year, 2023);
        assert_eq!(config.prediction.grid, 10);
    }

    #[test]
    fn test_model_config_validate() {
        assert!(ModelConfig::default().validate().is_ok());

        let bad = ModelConfig {
            max_depth: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = ModelConfig {
            test_fraction: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[join]\nmissing_standing = \"zero_points\"\n\n[features]\nmissing_values = \"impute\"\n\n[model]\nn_estimators = 25"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.join.missing_standing, MissingStandingPolicy::ZeroPoints);
        assert_eq!(config.features.missing_values, MissingValuePolicy::Impute);
        assert_eq!(config.model.n_estimators, 25);
        // Untouched sections keep their defaults
        assert_eq!(config.model.max_depth, 3);
        assert_eq!(config.prediction.laps, 60);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/f1dash.toml")));
        assert!(result.is_err());
    }
}
