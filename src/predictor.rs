use ndarray::{ArrayView1, ArrayView2, Axis};
use tracing::{info, warn};

use crate::config::{FeatureConfig, ModelConfig};
use crate::core::boosting::{rmse, train_test_split, GradientBoostingRegressor};
use crate::data::{FeatureEngineering, FeatureTable, FeatureVector};
use crate::error::{DashboardError, ModelError};
use crate::models::EnrichedResultRow;

/// Regression model contract: fit once, then predict single rows
pub trait Regressor {
    fn fit(&mut self, features: ArrayView2<f64>, target: ArrayView1<f64>)
        -> Result<(), ModelError>;

    fn predict_row(&self, row: ArrayView1<f64>) -> f64;

    fn name(&self) -> &'static str;
}

impl Regressor for GradientBoostingRegressor {
    fn fit(
        &mut self,
        features: ArrayView2<f64>,
        target: ArrayView1<f64>,
    ) -> Result<(), ModelError> {
        GradientBoostingRegressor::fit(self, features, target)
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.predict(row)
    }

    fn name(&self) -> &'static str {
        "gradient boosting"
    }
}

/// Fallback model that always predicts the training mean
#[derive(Debug, Clone, Default)]
pub struct MeanRegressor {
    mean: f64,
}

impl MeanRegressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for MeanRegressor {
    fn fit(
        &mut self,
        features: ArrayView2<f64>,
        target: ArrayView1<f64>,
    ) -> Result<(), ModelError> {
        if features.nrows() != target.len() {
            return Err(ModelError::ShapeMismatch {
                rows: features.nrows(),
                targets: target.len(),
            });
        }
        self.mean = target.mean().ok_or(ModelError::EmptyTrainingSet)?;
        Ok(())
    }

    fn predict_row(&self, _row: ArrayView1<f64>) -> f64 {
        self.mean
    }

    fn name(&self) -> &'static str {
        "mean"
    }
}

/// Race outcome predictor trained once over the feature table
pub struct RacePredictor {
    model: Box<dyn Regressor>,
    /// Hold-out RMSE; None when nothing was held out
    pub rmse: Option<f64>,
    pub train_size: usize,
    pub test_size: usize,
}

impl RacePredictor {
    /// Split, fit and evaluate
    ///
    /// Uses the mean predictor when the training split is smaller than
    /// `min_train_samples`.
    pub fn train(table: &FeatureTable, config: &ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        if table.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let (train_idx, test_idx) =
            train_test_split(table.len(), config.test_fraction, config.seed);
        // Tiny tables: train on everything and report no hold-out error
        let (train_idx, test_idx) = if train_idx.is_empty() {
            (test_idx, Vec::new())
        } else {
            (train_idx, test_idx)
        };

        let x_train = table.features.select(Axis(0), &train_idx);
        let y_train = table.target.select(Axis(0), &train_idx);

        let mut model: Box<dyn Regressor> = if train_idx.len() < config.min_train_samples {
            warn!(
                "Only {} training rows (< {}); using mean predictor",
                train_idx.len(),
                config.min_train_samples
            );
            Box::new(MeanRegressor::new())
        } else {
            Box::new(GradientBoostingRegressor::new(
                config.n_estimators,
                config.learning_rate,
                config.max_depth,
            ))
        };
        model.fit(x_train.view(), y_train.view())?;

        let actual: Vec<f64> = test_idx.iter().map(|&i| table.target[i]).collect();
        let predicted: Vec<f64> = test_idx
            .iter()
            .map(|&i| model.predict_row(table.features.row(i)))
            .collect();
        let rmse = rmse(&actual, &predicted);

        info!(
            "Trained {} model on {} rows (hold-out {}), RMSE: {}",
            model.name(),
            train_idx.len(),
            test_idx.len(),
            rmse.map(|r| format!("{:.2}", r))
                .unwrap_or_else(|| "n/a".to_string())
        );

        Ok(Self {
            model,
            rmse,
            train_size: train_idx.len(),
            test_size: test_idx.len(),
        })
    }

    /// Derive the feature table from enriched rows and train on it
    pub fn from_enriched(
        rows: &[EnrichedResultRow],
        features: &FeatureConfig,
        model: &ModelConfig,
    ) -> Result<Self, DashboardError> {
        let table = FeatureEngineering::derive(rows, features)?;
        Ok(Self::train(&table, model)?)
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Raw predicted finishing position
    pub fn predict(&self, input: &FeatureVector) -> f64 {
        self.model.predict_row(input.to_array().view())
    }

    /// Predicted finishing position rounded to a classified place
    pub fn predict_position(&self, input: &FeatureVector) -> u32 {
        self.predict(input).round().max(1.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JoinConfig, MissingValuePolicy};
    use crate::data::{JoinPipeline, NUM_FEATURES};
    use crate::error::FeatureError;
    use crate::testing::sample_context;
    use ndarray::{Array1, Array2};

    /// Synthetic table where finishing position tracks grid position
    fn grid_table(n: usize) -> FeatureTable {
        let mut features = Array2::<f64>::zeros((n, NUM_FEATURES));
        let mut target = Vec::with_capacity(n);
        for i in 0..n {
            let grid = (i % 20 + 1) as f64;
            features[[i, 0]] = 2020.0 + (i % 4) as f64;
            features[[i, 1]] = grid;
            features[[i, 2]] = 55.0 + (i % 5) as f64;
            features[[i, 3]] = 100.0 + (i % 9) as f64 * 10.0;
            target.push(grid);
        }
        FeatureTable {
            features,
            target: Array1::from(target),
            source_rows: (0..n).collect(),
            dropped: 0,
        }
    }

    fn input(grid: f64) -> FeatureVector {
        FeatureVector {
            year: 2023.0,
            grid,
            laps: 57.0,
            constructor_points: 140.0,
        }
    }

    #[test]
    fn test_mean_regressor() {
        let x = Array2::<f64>::zeros((3, NUM_FEATURES));
        let y = Array1::from(vec![1.0, 2.0, 6.0]);
        let mut model = MeanRegressor::new();
        model.fit(x.view(), y.view()).unwrap();
        assert!((model.predict_row(x.row(0)) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_train_boosting() {
        let table = grid_table(200);
        let predictor = RacePredictor::train(&table, &ModelConfig::default()).unwrap();

        assert_eq!(predictor.model_name(), "gradient boosting");
        assert_eq!(predictor.test_size, 60);
        assert_eq!(predictor.train_size, 140);
        assert!(predictor.rmse.unwrap() < 2.0);

        assert!(predictor.predict_position(&input(2.0)) < predictor.predict_position(&input(18.0)));
    }

    #[test]
    fn test_train_is_deterministic() {
        let table = grid_table(100);
        let a = RacePredictor::train(&table, &ModelConfig::default()).unwrap();
        let b = RacePredictor::train(&table, &ModelConfig::default()).unwrap();
        assert_eq!(a.rmse, b.rmse);
        assert_eq!(a.predict(&input(10.0)), b.predict(&input(10.0)));
    }

    #[test]
    fn test_small_table_uses_fallback() {
        let tables = JoinPipeline::run(&sample_context(), &JoinConfig::default());
        let table =
            FeatureEngineering::derive(&tables.enriched_results, &FeatureConfig::default())
                .unwrap();

        let predictor = RacePredictor::train(&table, &ModelConfig::default()).unwrap();

        assert_eq!(predictor.model_name(), "mean");
        assert!(predictor.predict_position(&input(10.0)) >= 1);
    }

    #[test]
    fn test_single_row_has_no_holdout_rmse() {
        let table = FeatureTable {
            features: Array2::from_elem((1, NUM_FEATURES), 1.0),
            target: Array1::from(vec![3.0]),
            source_rows: vec![0],
            dropped: 0,
        };

        let predictor = RacePredictor::train(&table, &ModelConfig::default()).unwrap();

        assert_eq!(predictor.train_size, 1);
        assert_eq!(predictor.test_size, 0);
        assert_eq!(predictor.rmse, None);
        assert_eq!(predictor.predict_position(&input(10.0)), 3);
    }

    #[test]
    fn test_from_enriched() {
        let tables = JoinPipeline::run(&sample_context(), &JoinConfig::default());

        let predictor = RacePredictor::from_enriched(
            &tables.enriched_results,
            &FeatureConfig::default(),
            &ModelConfig::default(),
        )
        .unwrap();
        assert_eq!(predictor.model_name(), "mean");

        let strict = FeatureConfig {
            missing_values: MissingValuePolicy::Error,
        };
        let err = RacePredictor::from_enriched(
            &tables.enriched_results,
            &strict,
            &ModelConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            DashboardError::Feature(FeatureError::MissingValue { feature: "grid", .. })
        ));

        let err =
            RacePredictor::from_enriched(&[], &FeatureConfig::default(), &ModelConfig::default())
                .err()
                .unwrap();
        assert!(matches!(err, DashboardError::Model(ModelError::EmptyTrainingSet)));
    }

    #[test]
    fn test_empty_table_fails() {
        let table = FeatureTable {
            features: Array2::zeros((0, NUM_FEATURES)),
            target: Array1::zeros(0),
            source_rows: Vec::new(),
            dropped: 0,
        };
        assert!(matches!(
            RacePredictor::train(&table, &ModelConfig::default()),
            Err(ModelError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_invalid_config_fails() {
        let config = ModelConfig {
            learning_rate: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            RacePredictor::train(&grid_table(20), &config),
            Err(ModelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_predict_position_rounds_and_clamps() {
        let mut model = MeanRegressor::new();
        let x = Array2::<f64>::zeros((2, NUM_FEATURES));
        model
            .fit(x.view(), Array1::from(vec![-3.0, -1.0]).view())
            .unwrap();
        let predictor = RacePredictor {
            model: Box::new(model),
            rmse: None,
            train_size: 2,
            test_size: 0,
        };
        assert_eq!(predictor.predict_position(&input(1.0)), 1);
    }
}
