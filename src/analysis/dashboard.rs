//! Dashboard view for one driver/season selection
//!
//! Collects everything the presentation layer renders: profile, summary
//! metrics and chart series. Empty series mean "no data" and are rendered as
//! placeholders.

use serde::Serialize;
use tracing::debug;

use super::metrics::{
    calculate_summary, constructor_points_series, lap_summaries, points_per_race,
    points_per_year, ConstructorSeries, LapSummary, PerformanceSummary, RacePoints, YearPoints,
};
use super::selection::{Selection, SelectionView};
use crate::data::{DataContext, DerivedTables, JoinPipeline};
use crate::models::{Driver, DriverStanding, EnrichedResultRow};

/// Driver identity shown at the top of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverProfile {
    pub driver_id: u32,
    pub full_name: String,
    pub nationality: String,
}

impl From<&Driver> for DriverProfile {
    fn from(driver: &Driver) -> Self {
        Self {
            driver_id: driver.driver_id,
            full_name: driver.full_name(),
            nationality: driver.nationality.clone(),
        }
    }
}

/// Championship position after one race
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingPoint {
    pub race_id: u32,
    pub position: Option<u32>,
}

/// Complete presentation-ready dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DriverDashboard {
    pub selection: Selection,
    /// First driver carrying the selected surname
    pub profile: Option<DriverProfile>,
    pub summary: PerformanceSummary,
    pub points_per_race: Vec<RacePoints>,
    pub sprint_points: Vec<RacePoints>,
    pub constructor_points: Vec<ConstructorSeries>,
    pub standings: Vec<StandingPoint>,
    /// Lap times across all seasons of the profiled driver
    pub lap_times: Vec<LapSummary>,
    /// Result points per season across the driver's career
    pub points_per_year: Vec<YearPoints>,
}

impl DriverDashboard {
    pub fn build(ctx: &DataContext, tables: &DerivedTables, selection: Selection) -> Self {
        let view = SelectionView::apply(selection, tables, ctx);
        let race_ids = view.race_ids();
        let driver = ctx.find_driver_by_surname(&view.selection.surname);

        let (standings, lap_times) = match driver {
            Some(driver) => {
                let standings = ctx
                    .driver_standings
                    .iter()
                    .filter(|s| s.driver_id == driver.driver_id && race_ids.contains(&s.race_id))
                    .map(|s: &DriverStanding| StandingPoint {
                        race_id: s.race_id,
                        position: s.position,
                    })
                    .collect();

                let laps = ctx
                    .lap_times
                    .iter()
                    .filter(|l| l.driver_id == driver.driver_id);
                let lap_rows = JoinPipeline::lap_rows(laps, &ctx.races);

                (standings, lap_summaries(&lap_rows))
            }
            None => (Vec::new(), Vec::new()),
        };

        let career: Vec<&EnrichedResultRow> = tables
            .enriched_results
            .iter()
            .filter(|r| r.row.surname == view.selection.surname)
            .collect();

        debug!(
            "Dashboard for {} {}: {} results, {} sprint results",
            view.selection.surname,
            view.selection.season,
            view.driver_results.len(),
            view.sprint_results.len()
        );

        Self {
            profile: driver.map(DriverProfile::from),
            summary: calculate_summary(&view.driver_results),
            points_per_race: points_per_race(&view.driver_results),
            sprint_points: points_per_race(&view.sprint_results),
            constructor_points: constructor_points_series(&view.constructor_standings),
            standings,
            lap_times,
            points_per_year: points_per_year(&career),
            selection: view.selection,
        }
    }

    /// Nothing matched the selection
    pub fn is_empty(&self) -> bool {
        self.summary.total_races == 0
    }
}
