use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Failure while reading one of the source tables. Always fatal for the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Source table '{table}' not found at {path:?}")]
    Missing { table: &'static str, path: PathBuf },

    #[error("Failed to parse '{table}': {source}")]
    Malformed {
        table: &'static str,
        #[source]
        source: PolarsError,
    },

    #[error("Source table '{table}' has no '{column}' column")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("Source table '{table}' row {row} has no value for key column '{column}'")]
    NullKey {
        table: &'static str,
        column: &'static str,
        row: usize,
    },
}

/// Feature extraction errors (only raised under the `error` missing-value policy)
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Result row {row} is missing feature '{feature}'")]
    MissingValue { row: usize, feature: &'static str },
}

/// Model training errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("Feature matrix has {rows} rows but target has {targets} values")]
    ShapeMismatch { rows: usize, targets: usize },

    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),
}

/// Application error types
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Validation functions
pub fn validate_test_fraction(fraction: f64) -> Result<(), ModelError> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(ModelError::InvalidConfig(format!(
            "Test fraction must be in [0, 1), got {}",
            fraction
        )));
    }
    Ok(())
}

pub fn validate_learning_rate(rate: f64) -> Result<(), ModelError> {
    if !(rate > 0.0 && rate <= 1.0) {
        return Err(ModelError::InvalidConfig(format!(
            "Learning rate must be in (0, 1], got {}",
            rate
        )));
    }
    Ok(())
}

pub fn validate_grid_position(grid: u32) -> Result<(), ModelError> {
    if !(1..=20).contains(&grid) {
        return Err(ModelError::InvalidConfig(format!(
            "Grid position must be between 1 and 20, got {}",
            grid
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_test_fraction() {
        assert!(validate_test_fraction(0.0).is_ok());
        assert!(validate_test_fraction(0.3).is_ok());
        assert!(validate_test_fraction(1.0).is_err());
        assert!(validate_test_fraction(-0.1).is_err());
    }

    #[test]
    fn test_validate_learning_rate() {
        assert!(validate_learning_rate(0.1).is_ok());
        assert!(validate_learning_rate(1.0).is_ok());
        assert!(validate_learning_rate(0.0).is_err());
        assert!(validate_learning_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_grid_position() {
        for grid in 1..=20 {
            assert!(validate_grid_position(grid).is_ok());
        }
        assert!(validate_grid_position(0).is_err());
        assert!(validate_grid_position(21).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = LoadError::MissingColumn {
            table: "results",
            column: "raceId",
        };
        assert!(err.to_string().contains("raceId"));

        let err: DashboardError = ModelError::EmptyTrainingSet.into();
        assert!(err.to_string().contains("empty training set"));
    }
}
