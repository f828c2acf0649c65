//! Game calendar keys.
//!
//! The board game runs in months of 28 days. Every state transition in the
//! quest engine is stamped with the `DayKey` it happened on, and elapsed-time
//! requirements measure against those stamps.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::QuestError;

/// Days in one game month.
pub const DAYS_PER_MONTH: u8 = 28;

/// A day on the game calendar. Months and days are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayKey {
    pub month: u16,
    pub day: u8,
}

impl DayKey {
    /// Create a day key, clamping `day` into `1..=28`.
    #[must_use]
    pub fn new(month: u16, day: u8) -> Self {
        Self {
            month: month.max(1),
            day: day.clamp(1, DAYS_PER_MONTH),
        }
    }

    /// The first day of the game.
    #[must_use]
    pub fn first() -> Self {
        Self::new(1, 1)
    }

    /// Absolute day number, starting at 0 for month 1 day 1.
    #[must_use]
    pub fn ordinal(self) -> i64 {
        (i64::from(self.month) - 1) * i64::from(DAYS_PER_MONTH) + i64::from(self.day) - 1
    }

    /// Days elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[must_use]
    pub fn days_since(self, earlier: DayKey) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    /// The following day.
    #[must_use]
    pub fn next_day(self) -> Self {
        self.plus_days(1)
    }

    /// The day `days` after this one.
    #[must_use]
    pub fn plus_days(self, days: u32) -> Self {
        let ordinal = self.ordinal() + i64::from(days);
        let per_month = i64::from(DAYS_PER_MONTH);
        Self {
            month: (ordinal / per_month + 1) as u16,
            day: (ordinal % per_month + 1) as u8,
        }
    }
}

impl Default for DayKey {
    fn default() -> Self {
        Self::first()
    }
}

impl std::fmt::Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.month, self.day)
    }
}

impl FromStr for DayKey {
    type Err = QuestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QuestError::InvalidDayKey(s.to_string());
        let (month, day) = s.trim().split_once(':').ok_or_else(invalid)?;
        let month: u16 = month.trim().parse().map_err(|_| invalid())?;
        let day: u8 = day.trim().parse().map_err(|_| invalid())?;
        if month == 0 || day == 0 || day > DAYS_PER_MONTH {
            return Err(invalid());
        }
        Ok(Self { month, day })
    }
}
