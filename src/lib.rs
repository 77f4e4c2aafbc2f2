//! F1 Dashboard - Formula 1 performance analytics
//!
//! This library provides:
//! - Typed loading of the Ergast-style CSV tables
//! - Inner-join pipeline building the analysis-ready result tables
//! - Driver/season selection, summary metrics and chart series
//! - Feature extraction and a gradient-boosted race outcome model
//!
//! # Example
//!
//! ```no_run
//! use f1dash::analysis::{DriverDashboard, Selection};
//! use f1dash::config::AppConfig;
//! use f1dash::data::{DataContext, JoinPipeline};
//!
//! let config = AppConfig::default();
//! let ctx = DataContext::load(&config.data)?;
//! let tables = JoinPipeline::run(&ctx, &config.join);
//!
//! let dashboard = DriverDashboard::build(&ctx, &tables, Selection::new("Verstappen", 2023));
//! println!("Average finish: {}", dashboard.summary.average_finish);
//! # Ok::<(), f1dash::error::LoadError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod predictor;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use analysis::{DriverDashboard, FinishAverage, PerformanceSummary, Selection};
pub use config::AppConfig;
pub use data::{DataContext, DerivedTables, FeatureTable, FeatureVector, JoinPipeline};
pub use error::{DashboardError, LoadError};
pub use models::{
    ConstructorStanding, Driver, DriverResultRow, DriverStanding, EnrichedResultRow, LapTime,
    Race, RaceResult, SprintRow,
};
pub use predictor::{MeanRegressor, RacePredictor, Regressor};
