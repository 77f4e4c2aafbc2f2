//! Driver/season analysis over the derived tables

pub mod dashboard;
pub mod metrics;
pub mod selection;

pub use dashboard::{DriverDashboard, DriverProfile, StandingPoint};
pub use metrics::{calculate_summary, FinishAverage, PerformanceSummary};
pub use selection::{Selection, SelectionView};
