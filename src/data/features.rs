//! Feature Engineering
//!
//! Projects the enriched result rows into the numeric matrix used to fit the
//! race outcome model.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{FeatureConfig, MissingValuePolicy};
use crate::error::FeatureError;
use crate::models::EnrichedResultRow;

/// Number of model features
pub const NUM_FEATURES: usize = 4;

/// Feature column names in model input order
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = ["year", "grid", "laps", "constructor_points"];

/// One model input row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub year: f64,
    pub grid: f64,
    pub laps: f64,
    pub constructor_points: f64,
}

impl FeatureVector {
    /// Convert to model input order (matches [`FEATURE_NAMES`])
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from(vec![self.year, self.grid, self.laps, self.constructor_points])
    }
}

/// Raw feature values of an enriched row, `None` where the source was missing
fn raw_features(row: &EnrichedResultRow) -> [Option<f64>; NUM_FEATURES] {
    [
        Some(row.row.year as f64),
        row.row.result.grid.map(f64::from),
        row.row.result.laps.map(f64::from),
        row.constructor_points,
    ]
}

/// Feature matrix and target vector, row-aligned
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// n_rows × [`NUM_FEATURES`]
    pub features: Array2<f64>,
    /// positionOrder per row
    pub target: Array1<f64>,
    /// Index into the enriched result table for each feature row
    pub source_rows: Vec<usize>,
    /// Rows excluded under the `drop` policy
    pub dropped: usize,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Feature engineering for enriched result rows
pub struct FeatureEngineering;

impl FeatureEngineering {
    pub fn derive(
        rows: &[EnrichedResultRow],
        config: &FeatureConfig,
    ) -> Result<FeatureTable, FeatureError> {
        let raw: Vec<[Option<f64>; NUM_FEATURES]> = rows.iter().map(raw_features).collect();

        let (kept, filled): (Vec<usize>, Vec<[f64; NUM_FEATURES]>) = match config.missing_values
        {
            MissingValuePolicy::Drop => raw
                .iter()
                .enumerate()
                .filter_map(|(i, values)| Self::complete(values).map(|v| (i, v)))
                .unzip(),
            MissingValuePolicy::Impute => {
                let means = Self::column_means(&raw);
                raw.iter()
                    .enumerate()
                    .map(|(i, values)| {
                        let mut out = [0.0; NUM_FEATURES];
                        for (j, value) in values.iter().enumerate() {
                            out[j] = value.unwrap_or(means[j]);
                        }
                        (i, out)
                    })
                    .unzip()
            }
            MissingValuePolicy::Error => {
                let mut kept = Vec::with_capacity(raw.len());
                let mut filled = Vec::with_capacity(raw.len());
                for (i, values) in raw.iter().enumerate() {
                    match Self::complete(values) {
                        Some(v) => {
                            kept.push(i);
                            filled.push(v);
                        }
                        None => {
                            let j = values.iter().position(Option::is_none).unwrap_or(0);
                            return Err(FeatureError::MissingValue {
                                row: i,
                                feature: FEATURE_NAMES[j],
                            });
                        }
                    }
                }
                (kept, filled)
            }
        };

        let dropped = rows.len() - kept.len();
        if dropped > 0 {
            warn!("Dropped {} result rows with missing feature values", dropped);
        }

        let mut features = Array2::<f64>::zeros((kept.len(), NUM_FEATURES));
        for (i, values) in filled.iter().enumerate() {
            for (j, value) in values.iter().enumerate() {
                features[[i, j]] = *value;
            }
        }

        let target: Array1<f64> = kept
            .iter()
            .map(|&i| rows[i].row.result.position_order as f64)
            .collect();

        debug!("Derived {} feature rows", target.len());

        Ok(FeatureTable {
            features,
            target,
            source_rows: kept,
            dropped,
        })
    }

    fn complete(values: &[Option<f64>; NUM_FEATURES]) -> Option<[f64; NUM_FEATURES]> {
        let mut out = [0.0; NUM_FEATURES];
        for (j, value) in values.iter().enumerate() {
            out[j] = (*value)?;
        }
        Some(out)
    }

    /// Mean of the present values per column; 0 for a column with none
    fn column_means(raw: &[[Option<f64>; NUM_FEATURES]]) -> [f64; NUM_FEATURES] {
        let mut means = [0.0; NUM_FEATURES];
        for (j, mean) in means.iter_mut().enumerate() {
            let present: Vec<f64> = raw.iter().filter_map(|values| values[j]).collect();
            if !present.is_empty() {
                *mean = present.iter().sum::<f64>() / present.len() as f64;
            }
        }
        means
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JoinConfig;
    use crate::data::JoinPipeline;
    use crate::testing::sample_context;

    fn config(policy: MissingValuePolicy) -> FeatureConfig {
        FeatureConfig {
            missing_values: policy,
        }
    }

    fn enriched() -> Vec<EnrichedResultRow> {
        JoinPipeline::run(&sample_context(), &JoinConfig::default()).enriched_results
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(FEATURE_NAMES.len(), NUM_FEATURES);
        assert_eq!(FEATURE_NAMES[0], "year");
        assert_eq!(FEATURE_NAMES[3], "constructor_points");
    }

    #[test]
    fn test_feature_vector_order() {
        let v = FeatureVector {
            year: 2023.0,
            grid: 10.0,
            laps: 60.0,
            constructor_points: 25.0,
        };
        assert_eq!(v.to_array().to_vec(), vec![2023.0, 10.0, 60.0, 25.0]);
    }

    #[test]
    fn test_derive_projects_columns() {
        let rows = enriched();
        let table = FeatureEngineering::derive(&rows, &config(MissingValuePolicy::Drop)).unwrap();

        // Third enriched row (Hamilton, 2022) has no grid or laps
        assert_eq!(table.len(), 2);
        assert_eq!(table.dropped, 1);
        assert_eq!(table.source_rows, vec![0, 1]);
        assert_eq!(table.features.dim(), (2, NUM_FEATURES));

        assert_eq!(table.features.row(0).to_vec(), vec![2023.0, 1.0, 57.0, 43.0]);
        assert_eq!(table.features.row(1).to_vec(), vec![2023.0, 15.0, 50.0, 87.0]);
        assert_eq!(table.target.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_derive_impute_keeps_alignment() {
        let rows = enriched();
        let table =
            FeatureEngineering::derive(&rows, &config(MissingValuePolicy::Impute)).unwrap();

        assert_eq!(table.len(), rows.len());
        assert_eq!(table.dropped, 0);
        assert_eq!(table.source_rows, vec![0, 1, 2]);

        // Missing grid and laps replaced with column means of present values
        let imputed = table.features.row(2);
        assert!((imputed[0] - 2022.0).abs() < 1e-9);
        assert!((imputed[1] - 8.0).abs() < 1e-9);
        assert!((imputed[2] - 53.5).abs() < 1e-9);
        assert!((imputed[3] - 515.0).abs() < 1e-9);
        assert!((table.target[2] - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_derive_error_policy() {
        let rows = enriched();
        let err = FeatureEngineering::derive(&rows, &config(MissingValuePolicy::Error)).unwrap_err();

        match err {
            FeatureError::MissingValue { row, feature } => {
                assert_eq!(row, 2);
                assert_eq!(feature, "grid");
            }
        }

        let complete = &rows[..2];
        let table =
            FeatureEngineering::derive(complete, &config(MissingValuePolicy::Error)).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_derive_empty() {
        let table = FeatureEngineering::derive(&[], &FeatureConfig::default()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.features.dim(), (0, NUM_FEATURES));
    }
}
