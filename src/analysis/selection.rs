//! Selection Filter
//!
//! Narrows the derived tables down to one driver surname and one season.
//! Filters borrow from the tables, preserve row order and never fail; an empty
//! view is a valid outcome.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::data::{DataContext, DerivedTables};
use crate::models::{ConstructorStanding, DriverResultRow, SprintRow};

/// A driver surname and season chosen by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub surname: String,
    pub season: i32,
}

impl Selection {
    pub fn new(surname: impl Into<String>, season: i32) -> Self {
        Self {
            surname: surname.into(),
            season,
        }
    }

    pub fn matches(&self, row: &DriverResultRow) -> bool {
        row.surname == self.surname && row.year == self.season
    }

    /// Rows matching this selection, in input order
    pub fn filter<'a, I>(&self, rows: I) -> Vec<&'a DriverResultRow>
    where
        I: IntoIterator<Item = &'a DriverResultRow>,
    {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

/// Distinct raceIds of the given rows
pub fn race_ids<'a, I>(rows: I) -> HashSet<u32>
where
    I: IntoIterator<Item = &'a DriverResultRow>,
{
    rows.into_iter().map(|row| row.result.race_id).collect()
}

/// Filtered subsets for one selection
#[derive(Debug, Clone)]
pub struct SelectionView<'a> {
    pub selection: Selection,
    pub driver_results: Vec<&'a DriverResultRow>,
    /// Filtered independently; need not line up with `driver_results`
    pub sprint_results: Vec<&'a SprintRow>,
    /// Standings of every constructor in the races of `driver_results`
    pub constructor_standings: Vec<&'a ConstructorStanding>,
}

impl<'a> SelectionView<'a> {
    pub fn apply(selection: Selection, tables: &'a DerivedTables, ctx: &'a DataContext) -> Self {
        let driver_results = selection.filter(&tables.driver_results);
        let sprint_results = selection.filter(&tables.sprint_results);

        let races = race_ids(driver_results.iter().copied());
        let constructor_standings = ctx
            .constructor_standings
            .iter()
            .filter(|s| races.contains(&s.race_id))
            .collect();

        Self {
            selection,
            driver_results,
            sprint_results,
            constructor_standings,
        }
    }

    /// No grand prix result matched the selection
    pub fn is_empty(&self) -> bool {
        self.driver_results.is_empty()
    }

    pub fn race_ids(&self) -> HashSet<u32> {
        race_ids(self.driver_results.iter().copied())
    }
}
