//! Core modelling logic

pub mod boosting;

// Re-export commonly used types
pub use boosting::{rmse, train_test_split, GradientBoostingRegressor, RegressionTree};
