//! CSV data loading for the source tables

use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::DataConfig;
use crate::error::LoadError;
use crate::models::{
    ConstructorStanding, Driver, DriverStanding, LapTime, Race, RaceResult,
};

/// The seven source tables, each stored as `<name>.csv` in the data directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTable {
    Drivers,
    Races,
    Results,
    LapTimes,
    ConstructorStandings,
    DriverStandings,
    SprintResults,
}

impl SourceTable {
    pub const ALL: [SourceTable; 7] = [
        SourceTable::Drivers,
        SourceTable::Races,
        SourceTable::Results,
        SourceTable::LapTimes,
        SourceTable::ConstructorStandings,
        SourceTable::DriverStandings,
        SourceTable::SprintResults,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceTable::Drivers => "drivers",
            SourceTable::Races => "races",
            SourceTable::Results => "results",
            SourceTable::LapTimes => "lap_times",
            SourceTable::ConstructorStandings => "constructor_standings",
            SourceTable::DriverStandings => "driver_standings",
            SourceTable::SprintResults => "sprint_results",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Typed view over a loaded DataFrame that maps polars failures to `LoadError`
struct TableFrame {
    table: &'static str,
    df: DataFrame,
}

impl TableFrame {
    fn read(dir: &Path, table: SourceTable, null_marker: &str) -> Result<Self, LoadError> {
        let path = table.path_in(dir);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .map_parse_options(|opts| {
                opts.with_null_values(Some(NullValues::AllColumnsSingle(
                    null_marker.to_string().into(),
                )))
            })
            .try_into_reader_with_file_path(Some(path.clone()))
            .and_then(|reader| reader.finish())
            .map_err(|source| LoadError::Malformed {
                table: table.name(),
                source,
            })?;

        debug!("Read {} rows from {:?}", df.height(), path);

        Ok(Self {
            table: table.name(),
            df,
        })
    }

    fn height(&self) -> usize {
        self.df.height()
    }

    /// Fetch a column and parse it as `dtype`; values that do not parse are an error
    fn typed(&self, column: &'static str, dtype: &DataType) -> Result<Series, LoadError> {
        let series = self
            .df
            .column(column)
            .map_err(|_| LoadError::MissingColumn {
                table: self.table,
                column,
            })?;

        series.strict_cast(dtype).map_err(|source| LoadError::Malformed {
            table: self.table,
            source,
        })
    }

    fn malformed(&self, source: PolarsError) -> LoadError {
        LoadError::Malformed {
            table: self.table,
            source,
        }
    }

    fn opt_u32(&self, column: &'static str) -> Result<Vec<Option<u32>>, LoadError> {
        let series = self.typed(column, &DataType::UInt32)?;
        let ca = series.u32().map_err(|e| self.malformed(e))?;
        Ok(ca.into_iter().collect())
    }

    fn opt_u64(&self, column: &'static str) -> Result<Vec<Option<u64>>, LoadError> {
        let series = self.typed(column, &DataType::UInt64)?;
        let ca = series.u64().map_err(|e| self.malformed(e))?;
        Ok(ca.into_iter().collect())
    }

    fn opt_f64(&self, column: &'static str) -> Result<Vec<Option<f64>>, LoadError> {
        let series = self.typed(column, &DataType::Float64)?;
        let ca = series.f64().map_err(|e| self.malformed(e))?;
        Ok(ca.into_iter().collect())
    }

    /// Key columns must be present on every row
    fn key_u32(&self, column: &'static str) -> Result<Vec<u32>, LoadError> {
        self.opt_u32(column)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or(LoadError::NullKey {
                    table: self.table,
                    column,
                    row,
                })
            })
            .collect()
    }

    fn key_i32(&self, column: &'static str) -> Result<Vec<i32>, LoadError> {
        let series = self.typed(column, &DataType::Int32)?;
        let ca = series.i32().map_err(|e| self.malformed(e))?;
        ca.into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or(LoadError::NullKey {
                    table: self.table,
                    column,
                    row,
                })
            })
            .collect()
    }

    fn text(&self, column: &'static str) -> Result<Vec<String>, LoadError> {
        let series = self.typed(column, &DataType::String)?;
        let ca = series.str().map_err(|e| self.malformed(e))?;
        Ok(ca
            .into_iter()
            .map(|value| value.unwrap_or("").to_string())
            .collect())
    }
}

fn parse_drivers(frame: &TableFrame) -> Result<Vec<Driver>, LoadError> {
    let ids = frame.key_u32("driverId")?;
    let forenames = frame.text("forename")?;
    let surnames = frame.text("surname")?;
    let nationalities = frame.text("nationality")?;

    Ok(ids
        .into_iter()
        .zip(forenames)
        .zip(surnames)
        .zip(nationalities)
        .map(|(((driver_id, forename), surname), nationality)| Driver {
            driver_id,
            forename,
            surname,
            nationality,
        })
        .collect())
}

fn parse_races(frame: &TableFrame) -> Result<Vec<Race>, LoadError> {
    let ids = frame.key_u32("raceId")?;
    let years = frame.key_i32("year")?;
    let names = frame.text("name")?;

    Ok(ids
        .into_iter()
        .zip(years)
        .zip(names)
        .map(|((race_id, year), name)| Race {
            race_id,
            year,
            name,
        })
        .collect())
}

fn parse_results(frame: &TableFrame) -> Result<Vec<RaceResult>, LoadError> {
    let race_ids = frame.key_u32("raceId")?;
    let driver_ids = frame.key_u32("driverId")?;
    let constructor_ids = frame.key_u32("constructorId")?;
    let grids = frame.opt_u32("grid")?;
    let laps = frame.opt_u32("laps")?;
    let points = frame.opt_f64("points")?;
    let position_orders = frame.key_u32("positionOrder")?;

    let mut results = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        results.push(RaceResult {
            race_id: race_ids[i],
            driver_id: driver_ids[i],
            constructor_id: constructor_ids[i],
            grid: grids[i],
            laps: laps[i],
            points: points[i],
            position_order: position_orders[i],
        });
    }
    Ok(results)
}

fn parse_lap_times(frame: &TableFrame) -> Result<Vec<LapTime>, LoadError> {
    let race_ids = frame.key_u32("raceId")?;
    let driver_ids = frame.key_u32("driverId")?;
    let laps = frame.key_u32("lap")?;
    let milliseconds = frame.opt_u64("milliseconds")?;

    let mut lap_times = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        lap_times.push(LapTime {
            race_id: race_ids[i],
            driver_id: driver_ids[i],
            lap: laps[i],
            milliseconds: milliseconds[i],
        });
    }
    Ok(lap_times)
}

fn parse_constructor_standings(frame: &TableFrame) -> Result<Vec<ConstructorStanding>, LoadError> {
    let race_ids = frame.key_u32("raceId")?;
    let constructor_ids = frame.key_u32("constructorId")?;
    let points = frame.opt_f64("points")?;

    Ok(race_ids
        .into_iter()
        .zip(constructor_ids)
        .zip(points)
        .map(|((race_id, constructor_id), points)| ConstructorStanding {
            race_id,
            constructor_id,
            points,
        })
        .collect())
}

fn parse_driver_standings(frame: &TableFrame) -> Result<Vec<DriverStanding>, LoadError> {
    let race_ids = frame.key_u32("raceId")?;
    let driver_ids = frame.key_u32("driverId")?;
    let positions = frame.opt_u32("position")?;

    Ok(race_ids
        .into_iter()
        .zip(driver_ids)
        .zip(positions)
        .map(|((race_id, driver_id), position)| DriverStanding {
            race_id,
            driver_id,
            position,
        })
        .collect())
}

/// All source tables, loaded once and shared read-only by every computation
#[derive(Debug, Clone, Default)]
pub struct DataContext {
    pub drivers: Vec<Driver>,
    pub races: Vec<Race>,
    pub results: Vec<RaceResult>,
    pub lap_times: Vec<LapTime>,
    pub constructor_standings: Vec<ConstructorStanding>,
    pub driver_standings: Vec<DriverStanding>,
    pub sprint_results: Vec<RaceResult>,
}

impl DataContext {
    /// Load all seven tables from the configured data directory
    pub fn load(config: &DataConfig) -> Result<Self, LoadError> {
        let dir = config.dir.as_path();
        let marker = config.null_marker.as_str();
        // Every file must exist before any of them is parsed
        if let Some(table) = SourceTable::ALL
            .iter()
            .find(|table| !table.path_in(dir).is_file())
        {
            return Err(LoadError::Missing {
                table: table.name(),
                path: table.path_in(dir),
            });
        }

        let read = |table| TableFrame::read(dir, table, marker);

        let context = Self {
            drivers: parse_drivers(&read(SourceTable::Drivers)?)?,
            races: parse_races(&read(SourceTable::Races)?)?,
            results: parse_results(&read(SourceTable::Results)?)?,
            lap_times: parse_lap_times(&read(SourceTable::LapTimes)?)?,
            constructor_standings: parse_constructor_standings(&read(
                SourceTable::ConstructorStandings,
            )?)?,
            driver_standings: parse_driver_standings(&read(SourceTable::DriverStandings)?)?,
            sprint_results: parse_results(&read(SourceTable::SprintResults)?)?,
        };

        info!(
            "Loaded {} drivers, {} races, {} results, {} sprint results, {} lap times from {:?}",
            context.drivers.len(),
            context.races.len(),
            context.results.len(),
            context.sprint_results.len(),
            context.lap_times.len(),
            dir
        );

        Ok(context)
    }

    /// Distinct driver surnames in load order
    pub fn driver_surnames(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.drivers
            .iter()
            .map(|d| d.surname.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Distinct season years in load order
    pub fn seasons(&self) -> Vec<i32> {
        let mut seen = HashSet::new();
        self.races
            .iter()
            .map(|r| r.year)
            .filter(|y| seen.insert(*y))
            .collect()
    }

    /// First driver with the given surname
    pub fn find_driver_by_surname(&self, surname: &str) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.surname == surname)
    }
}
