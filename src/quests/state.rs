//! Lifecycle states and logic combinators.

use serde::{Deserialize, Serialize};

use crate::core::DayKey;

/// Quest lifecycle: New → Assigned → Active → {Complete, Failed}.
///
/// New is also the permanent state of an unassigned template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuestState {
    #[default]
    New,
    Assigned,
    Active,
    Complete,
    Failed,
}

impl QuestState {
    /// Complete or Failed.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for QuestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// State of one step in the dependency graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepState {
    #[default]
    None,
    Pending,
    Ready,
    Finished,
    Failed,
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// How a set of conditions is combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicType {
    #[default]
    And,
    Or,
}

/// What happens to a character's belongings lost while on this quest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LostInventoryRule {
    /// Normal game rules.
    #[default]
    Default,
    /// Lost items leave the game.
    Remove,
    /// Lost items go to the quest's lost-inventory location.
    ToLocation,
}

/// The day each state was last entered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateStamps<S> {
    stamps: Vec<(S, DayKey)>,
}

impl<S> Default for StateStamps<S> {
    fn default() -> Self {
        Self { stamps: Vec::new() }
    }
}

impl<S: Copy + PartialEq> StateStamps<S> {
    /// Record `day` for `state`, replacing an earlier stamp.
    pub fn stamp(&mut self, state: S, day: DayKey) {
        match self.stamps.iter_mut().find(|(s, _)| *s == state) {
            Some(entry) => entry.1 = day,
            None => self.stamps.push((state, day)),
        }
    }

    #[must_use]
    pub fn get(&self, state: S) -> Option<DayKey> {
        self.stamps.iter().find(|(s, _)| *s == state).map(|(_, day)| *day)
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}
