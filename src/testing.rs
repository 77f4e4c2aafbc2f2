//! Shared fixtures for unit tests

use std::path::Path;

use crate::data::DataContext;
use crate::models::{
    ConstructorStanding, Driver, DriverStanding, LapTime, Race, RaceResult,
};

pub(crate) fn driver(driver_id: u32, forename: &str, surname: &str, nationality: &str) -> Driver {
    Driver {
        driver_id,
        forename: forename.to_string(),
        surname: surname.to_string(),
        nationality: nationality.to_string(),
    }
}

pub(crate) fn race(race_id: u32, year: i32, name: &str) -> Race {
    Race {
        race_id,
        year,
        name: name.to_string(),
    }
}

pub(crate) fn result(
    race_id: u32,
    driver_id: u32,
    constructor_id: u32,
    grid: Option<u32>,
    laps: Option<u32>,
    points: f64,
    position_order: u32,
) -> RaceResult {
    RaceResult {
        race_id,
        driver_id,
        constructor_id,
        grid,
        laps,
        points: Some(points),
        position_order,
    }
}

pub(crate) fn standing(race_id: u32, constructor_id: u32, points: f64) -> ConstructorStanding {
    ConstructorStanding {
        race_id,
        constructor_id,
        points: Some(points),
    }
}

/// Three drivers over two 2023 races and one 2022 race.
///
/// The Hamilton result in race 10 (constructor 131) has no constructor
/// standing, and the Hamilton result in race 20 has no grid or lap count.
pub(crate) fn sample_context() -> DataContext {
    DataContext {
        drivers: vec![
            driver(1, "Max", "Verstappen", "Dutch"),
            driver(2, "Lewis", "Hamilton", "British"),
            driver(3, "Michael", "Schumacher", "German"),
        ],
        races: vec![
            race(10, 2023, "Bahrain Grand Prix"),
            race(11, 2023, "Saudi Arabian Grand Prix"),
            race(20, 2022, "Abu Dhabi Grand Prix"),
        ],
        results: vec![
            result(10, 1, 9, Some(1), Some(57), 25.0, 1),
            result(10, 2, 131, Some(7), Some(57), 18.0, 2),
            result(11, 1, 9, Some(15), Some(50), 18.0, 2),
            result(20, 2, 131, None, None, 0.0, 18),
        ],
        lap_times: vec![
            LapTime {
                race_id: 10,
                driver_id: 1,
                lap: 1,
                milliseconds: Some(97_000),
            },
            LapTime {
                race_id: 10,
                driver_id: 1,
                lap: 2,
                milliseconds: Some(96_500),
            },
            LapTime {
                race_id: 11,
                driver_id: 1,
                lap: 1,
                milliseconds: None,
            },
        ],
        constructor_standings: vec![
            standing(10, 9, 43.0),
            standing(11, 9, 87.0),
            standing(20, 131, 515.0),
        ],
        driver_standings: vec![
            DriverStanding {
                race_id: 10,
                driver_id: 1,
                position: Some(1),
            },
            DriverStanding {
                race_id: 11,
                driver_id: 1,
                position: Some(1),
            },
        ],
        sprint_results: vec![result(11, 1, 9, Some(1), Some(19), 8.0, 1)],
    }
}

/// Write the same data as [`sample_context`] as CSV files into `dir`
pub(crate) fn write_sample_csvs(dir: &Path) {
    let files = [
        (
            "drivers.csv",
            "driverId,driverRef,forename,surname,nationality\n\
             1,max_verstappen,Max,Verstappen,Dutch\n\
             2,hamilton,Lewis,Hamilton,British\n\
             3,michael_schumacher,Michael,Schumacher,German\n",
        ),
        (
            "races.csv",
            "raceId,year,round,name\n\
             10,2023,1,Bahrain Grand Prix\n\
             11,2023,2,Saudi Arabian Grand Prix\n\
             20,2022,22,Abu Dhabi Grand Prix\n",
        ),
        (
            "results.csv",
            "resultId,raceId,driverId,constructorId,grid,position,positionOrder,points,laps\n\
             1,10,1,9,1,1,1,25,57\n\
             2,10,2,131,7,2,2,18,57\n\
             3,11,1,9,15,2,2,18,50\n\
             4,20,2,131,\\N,\\N,18,0,\\N\n",
        ),
        (
            "lap_times.csv",
            "raceId,driverId,lap,position,time,milliseconds\n\
             10,1,1,1,1:37.000,97000\n\
             10,1,2,1,1:36.500,96500\n\
             11,1,1,1,\\N,\\N\n",
        ),
        (
            "constructor_standings.csv",
            "constructorStandingsId,raceId,constructorId,points,position,wins\n\
             1,10,9,43,1,1\n\
             2,11,9,87,1,2\n\
             3,20,131,515,3,1\n",
        ),
        (
            "driver_standings.csv",
            "driverStandingsId,raceId,driverId,points,position,wins\n\
             1,10,1,25,1,1\n\
             2,11,1,43,1,1\n",
        ),
        (
            "sprint_results.csv",
            "resultId,raceId,driverId,constructorId,grid,positionOrder,points,laps\n\
             1,11,1,9,1,1,8,19\n",
        ),
    ];

    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).expect("write fixture csv");
    }
}
