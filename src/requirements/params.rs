//! Per-evaluation parameters.

use serde::{Deserialize, Serialize};

use crate::core::DayKey;

/// A table roll outcome ("Locate" → "Discover chits").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOutcome {
    pub table: String,
    pub result: String,
}

/// What happened in the game event that triggered an evaluation pass.
///
/// Die and table fields describe a single random outcome. They are cleared
/// before a cascade re-evaluates the quest so that one roll cannot satisfy
/// two unrelated steps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementParams {
    pub day: DayKey,
    pub die_roll: Option<u8>,
    pub table_result: Option<TableOutcome>,
    pub search_target: Option<String>,
}

impl RequirementParams {
    #[must_use]
    pub fn new(day: DayKey) -> Self {
        Self {
            day,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_die_roll(mut self, roll: u8) -> Self {
        self.die_roll = Some(roll);
        self
    }

    #[must_use]
    pub fn with_table_result(mut self, table: impl Into<String>, result: impl Into<String>) -> Self {
        self.table_result = Some(TableOutcome {
            table: table.into(),
            result: result.into(),
        });
        self
    }

    #[must_use]
    pub fn with_search_target(mut self, target: impl Into<String>) -> Self {
        self.search_target = Some(target.into());
        self
    }

    /// Copy for a follow-up pass, without the die and table outcome.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self {
            day: self.day,
            die_roll: None,
            table_result: None,
            search_target: self.search_target.clone(),
        }
    }
}
