//! Data loading, joins and feature engineering modules

pub mod csv_loader;
pub mod features;
pub mod join;

// Re-export commonly used types
pub use csv_loader::{DataContext, SourceTable};
pub use features::{
    FeatureEngineering, FeatureTable, FeatureVector, FEATURE_NAMES, NUM_FEATURES,
};
pub use join::{inner_join, DerivedTables, JoinPipeline, KeyIndex};
