//! Performance Metrics
//!
//! Summary statistics and chart series over a filtered selection.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::models::{ConstructorStanding, DriverResultRow, EnrichedResultRow, LapRow};

/// Mean finishing position, or an explicit marker when there is nothing to average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishAverage {
    Value(f64),
    NotAvailable,
}

impl FinishAverage {
    pub fn value(&self) -> Option<f64> {
        match self {
            FinishAverage::Value(v) => Some(*v),
            FinishAverage::NotAvailable => None,
        }
    }
}

impl fmt::Display for FinishAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishAverage::Value(v) => write!(f, "{:.2}", v),
            FinishAverage::NotAvailable => write!(f, "not available"),
        }
    }
}

/// Driver performance over a selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_races: usize,
    pub total_wins: usize,
    pub average_finish: FinishAverage,
}

impl Default for PerformanceSummary {
    fn default() -> Self {
        Self {
            total_races: 0,
            total_wins: 0,
            average_finish: FinishAverage::NotAvailable,
        }
    }
}

/// Calculate summary metrics from filtered result rows
pub fn calculate_summary(rows: &[&DriverResultRow]) -> PerformanceSummary {
    if rows.is_empty() {
        return PerformanceSummary::default();
    }

    let total_races = rows
        .iter()
        .map(|r| r.result.race_id)
        .collect::<HashSet<_>>()
        .len();

    // A race counts once even if it somehow holds two winning rows
    let total_wins = rows
        .iter()
        .filter(|r| r.result.position_order == 1)
        .map(|r| r.result.race_id)
        .collect::<HashSet<_>>()
        .len();

    let average_finish = rows
        .iter()
        .map(|r| r.result.position_order as f64)
        .sum::<f64>()
        / rows.len() as f64;

    PerformanceSummary {
        total_races,
        total_wins,
        average_finish: FinishAverage::Value(average_finish),
    }
}

/// Points scored in one race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePoints {
    pub race_id: u32,
    pub race_name: String,
    pub points: f64,
}

/// Points per race, summed per raceId in first-seen order
pub fn points_per_race(rows: &[&DriverResultRow]) -> Vec<RacePoints> {
    let mut series: Vec<RacePoints> = Vec::new();
    for row in rows {
        let points = row.result.points.unwrap_or(0.0);
        match series.iter_mut().find(|p| p.race_id == row.result.race_id) {
            Some(existing) => existing.points += points,
            None => series.push(RacePoints {
                race_id: row.result.race_id,
                race_name: row.race_name.clone(),
                points,
            }),
        }
    }
    series
}

/// Constructor championship points over a season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorSeries {
    pub constructor_id: u32,
    /// (raceId, points), ordered by raceId
    pub points: Vec<(u32, f64)>,
}

/// Group standings by constructor, ordered by constructorId then raceId
pub fn constructor_points_series(standings: &[&ConstructorStanding]) -> Vec<ConstructorSeries> {
    let mut grouped: BTreeMap<u32, Vec<(u32, f64)>> = BTreeMap::new();
    for s in standings {
        if let Some(points) = s.points {
            grouped
                .entry(s.constructor_id)
                .or_default()
                .push((s.race_id, points));
        }
    }

    grouped
        .into_iter()
        .map(|(constructor_id, mut points)| {
            points.sort_by_key(|(race_id, _)| *race_id);
            ConstructorSeries {
                constructor_id,
                points,
            }
        })
        .collect()
}

/// Lap time statistics of a driver in one race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapSummary {
    pub race_id: u32,
    pub race_name: String,
    pub year: i32,
    pub laps: usize,
    pub best_ms: Option<u64>,
    pub mean_ms: Option<f64>,
}

/// Summarize lap rows per race, in first-seen order
pub fn lap_summaries(rows: &[LapRow]) -> Vec<LapSummary> {
    let mut order: Vec<u32> = Vec::new();
    let mut by_race: BTreeMap<u32, Vec<&LapRow>> = BTreeMap::new();
    for row in rows {
        let laps = by_race.entry(row.lap.race_id).or_default();
        if laps.is_empty() {
            order.push(row.lap.race_id);
        }
        laps.push(row);
    }

    order
        .into_iter()
        .filter_map(|race_id| {
            let laps = by_race.remove(&race_id)?;
            let first = laps.first()?;
            let times: Vec<u64> = laps.iter().filter_map(|l| l.lap.milliseconds).collect();
            let mean_ms = if times.is_empty() {
                None
            } else {
                Some(times.iter().sum::<u64>() as f64 / times.len() as f64)
            };

            Some(LapSummary {
                race_id,
                race_name: first.race_name.clone(),
                year: first.year,
                laps: laps.len(),
                best_ms: times.iter().min().copied(),
                mean_ms,
            })
        })
        .collect()
}

/// Result points per season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearPoints {
    pub year: i32,
    pub points: f64,
}

/// Sum of result points per year, ordered by year
pub fn points_per_year(rows: &[&EnrichedResultRow]) -> Vec<YearPoints> {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for row in rows {
        *by_year.entry(row.row.year).or_default() += row.row.result.points.unwrap_or(0.0);
    }
    by_year
        .into_iter()
        .map(|(year, points)| YearPoints { year, points })
        .collect()
}
