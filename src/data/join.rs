//! Join Pipeline
//!
//! Builds the derived tables from the source tables with hash-based inner
//! equijoins. Output order follows the left table, then right-table order
//! within a key, so re-running on the same input yields identical tables.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, info, warn};

use crate::config::{JoinConfig, MissingStandingPolicy};
use crate::data::DataContext;
use crate::models::{
    ConstructorStanding, DriverResultRow, EnrichedResultRow, LapRow, LapTime, Race, RaceResult,
    SprintRow,
};

/// Right-hand side of a join, indexed by key
///
/// Row positions are kept in table order for each key.
pub struct KeyIndex<'a, K, R> {
    rows: &'a [R],
    index: HashMap<K, Vec<usize>>,
}

impl<'a, K: Eq + Hash, R> KeyIndex<'a, K, R> {
    pub fn build<F>(rows: &'a [R], key: F) -> Self
    where
        F: Fn(&R) -> K,
    {
        let mut index: HashMap<K, Vec<usize>> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            index.entry(key(row)).or_default().push(i);
        }
        Self { rows, index }
    }

    /// All rows matching `key`, in table order
    pub fn get(&self, key: &K) -> impl Iterator<Item = &'a R> + '_ {
        let rows = self.rows;
        self.index
            .get(key)
            .into_iter()
            .flatten()
            .map(move |&i| &rows[i])
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Inner equijoin of `left` and `right`
///
/// Every left row is paired with every right row sharing its key (fan-out);
/// rows without a match on the other side are dropped.
pub fn inner_join<'a, L, R, K, FL, FR>(
    left: &'a [L],
    right: &'a [R],
    left_key: FL,
    right_key: FR,
) -> Vec<(&'a L, &'a R)>
where
    K: Eq + Hash,
    FL: Fn(&L) -> K,
    FR: Fn(&R) -> K,
{
    let index = KeyIndex::build(right, right_key);
    left.iter()
        .flat_map(|l| index.get(&left_key(l)).map(move |r| (l, r)))
        .collect()
}

/// Materialized derived tables
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivedTables {
    pub driver_results: Vec<DriverResultRow>,
    pub enriched_results: Vec<EnrichedResultRow>,
    pub sprint_results: Vec<SprintRow>,
    /// Results excluded from `enriched_results` for lack of a constructor standing
    pub dropped_without_standing: usize,
}

impl DerivedTables {
    /// True when the driver or enriched results came out empty
    ///
    /// Sprint results are not considered; most seasons have no sprints.
    pub fn is_degenerate(&self) -> bool {
        self.driver_results.is_empty() || self.enriched_results.is_empty()
    }
}

/// Fixed sequence of joins producing the derived tables
pub struct JoinPipeline;

impl JoinPipeline {
    pub fn run(ctx: &DataContext, config: &JoinConfig) -> DerivedTables {
        let driver_results = Self::driver_results(ctx, &ctx.results);
        let (enriched_results, dropped_without_standing) =
            Self::enriched_results(ctx, config.missing_standing);
        let sprint_results = Self::driver_results(ctx, &ctx.sprint_results);

        if dropped_without_standing > 0 {
            match config.missing_standing {
                MissingStandingPolicy::Drop => warn!(
                    "{} results have no constructor standing and were dropped",
                    dropped_without_standing
                ),
                MissingStandingPolicy::ZeroPoints => info!(
                    "{} results have no constructor standing; using zero points",
                    dropped_without_standing
                ),
            }
        }

        for (name, len) in [
            ("driver results", driver_results.len()),
            ("enriched results", enriched_results.len()),
            ("sprint results", sprint_results.len()),
        ] {
            if len == 0 {
                warn!("Join produced no {}", name);
            } else {
                debug!("Joined {} {}", len, name);
            }
        }

        let dropped_without_standing = match config.missing_standing {
            MissingStandingPolicy::Drop => dropped_without_standing,
            MissingStandingPolicy::ZeroPoints => 0,
        };

        DerivedTables {
            driver_results,
            enriched_results,
            sprint_results,
            dropped_without_standing,
        }
    }

    /// results ⋈ drivers on driverId, then ⋈ races on raceId
    pub fn driver_results(ctx: &DataContext, results: &[RaceResult]) -> Vec<DriverResultRow> {
        let races = KeyIndex::build(&ctx.races, |r| r.race_id);

        inner_join(results, &ctx.drivers, |r| r.driver_id, |d| d.driver_id)
            .into_iter()
            .flat_map(|(result, driver)| {
                races
                    .get(&result.race_id)
                    .map(move |race| DriverResultRow::new(result, driver, race))
            })
            .collect()
    }

    /// results ⋈ races ⋈ drivers ⋈ constructor_standings on (constructorId, raceId)
    ///
    /// Returns the rows and the number of joined results that had no standing.
    pub fn enriched_results(
        ctx: &DataContext,
        policy: MissingStandingPolicy,
    ) -> (Vec<EnrichedResultRow>, usize) {
        let drivers = KeyIndex::build(&ctx.drivers, |d| d.driver_id);
        let standings: KeyIndex<(u32, u32), ConstructorStanding> =
            KeyIndex::build(&ctx.constructor_standings, |s| (s.constructor_id, s.race_id));

        let mut rows = Vec::new();
        let mut unmatched = 0;

        for (result, race) in inner_join(&ctx.results, &ctx.races, |r| r.race_id, |r| r.race_id) {
            for driver in drivers.get(&result.driver_id) {
                let base = DriverResultRow::new(result, driver, race);
                let key = (result.constructor_id, result.race_id);

                if !standings.contains(&key) {
                    unmatched += 1;
                    if policy == MissingStandingPolicy::ZeroPoints {
                        rows.push(EnrichedResultRow {
                            row: base,
                            constructor_points: Some(0.0),
                            standing_matched: false,
                        });
                    }
                    continue;
                }

                for standing in standings.get(&key) {
                    rows.push(EnrichedResultRow {
                        row: base.clone(),
                        constructor_points: standing.points,
                        standing_matched: true,
                    });
                }
            }
        }

        (rows, unmatched)
    }

    /// lap_times ⋈ races on raceId
    pub fn lap_rows<'a, I>(laps: I, races: &[Race]) -> Vec<LapRow>
    where
        I: IntoIterator<Item = &'a LapTime>,
    {
        let races = KeyIndex::build(races, |r| r.race_id);
        laps.into_iter()
            .flat_map(|lap| {
                races.get(&lap.race_id).map(move |race| LapRow {
                    lap: lap.clone(),
                    year: race.year,
                    race_name: race.name.clone(),
                })
            })
            .collect()
    }
}
