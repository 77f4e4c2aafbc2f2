use serde::{Deserialize, Serialize};

/// Driver master data (drivers.csv)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: u32,
    pub forename: String,
    pub surname: String,
    pub nationality: String,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.forename, self.surname)
    }
}

/// Race calendar entry (races.csv)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub race_id: u32,
    pub year: i32,
    pub name: String,
}

/// Classified result of one driver in one session (results.csv, sprint_results.csv)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub race_id: u32,
    pub driver_id: u32,
    pub constructor_id: u32,
    pub grid: Option<u32>,
    pub laps: Option<u32>,
    pub points: Option<f64>,
    pub position_order: u32,
}

/// Constructor championship standing after a race (constructor_standings.csv)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorStanding {
    pub race_id: u32,
    pub constructor_id: u32,
    pub points: Option<f64>,
}

/// Driver championship standing after a race (driver_standings.csv)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverStanding {
    pub race_id: u32,
    pub driver_id: u32,
    pub position: Option<u32>,
}

/// Single lap time (lap_times.csv)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapTime {
    pub race_id: u32,
    pub driver_id: u32,
    pub lap: u32,
    pub milliseconds: Option<u64>,
}

/// Result ⋈ Driver ⋈ Race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverResultRow {
    #[serde(flatten)]
    pub result: RaceResult,
    pub year: i32,
    pub race_name: String,
    pub forename: String,
    pub surname: String,
    pub nationality: String,
}

impl DriverResultRow {
    pub fn new(result: &RaceResult, driver: &Driver, race: &Race) -> Self {
        Self {
            result: result.clone(),
            year: race.year,
            race_name: race.name.clone(),
            forename: driver.forename.clone(),
            surname: driver.surname.clone(),
            nationality: driver.nationality.clone(),
        }
    }
}

/// SprintResult ⋈ Driver ⋈ Race. Same shape as a grand prix row.
pub type SprintRow = DriverResultRow;

/// Result ⋈ Race ⋈ Driver ⋈ ConstructorStanding on (constructorId, raceId)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResultRow {
    #[serde(flatten)]
    pub row: DriverResultRow,
    /// Constructor championship points after this race
    pub constructor_points: Option<f64>,
    /// False when no standing matched and the row was kept with zero points
    pub standing_matched: bool,
}

/// LapTime ⋈ Race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRow {
    #[serde(flatten)]
    pub lap: LapTime,
    pub year: i32,
    pub race_name: String,
}
