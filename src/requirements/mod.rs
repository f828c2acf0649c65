//! Requirements: the conditions a step checks every evaluation pass.
//!
//! Requirement kinds are a closed enum so quest definitions round-trip
//! through serde. Kinds the engine does not know about go through
//! [`Requirement::Custom`] and the host's evaluator in [`QuestHooks`].
//!
//! Every kind supports the orchestration contract steps rely on:
//! - evaluation ([`RequirementEvaluator::evaluate`])
//! - `activate`, called when the owning quest becomes Active
//! - `uses_minor_character` / `uses_location`, so removals can be refused
//! - `update_ids`, so copies reference their own locations and characters

mod params;

pub use params::{RequirementParams, TableOutcome};

use serde::{Deserialize, Serialize};

use crate::core::{DayKey, EntityId, IdMap, QuestCharacter};
use crate::error::Result;
use crate::hooks::QuestHooks;
use crate::quests::{MinorCharacter, QuestLocation, QuestState};

/// A condition attached to a quest step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Requirement {
    /// The quest has been activated by its owner.
    Active,

    /// A character state value is at least `min`.
    Attribute { key: String, min: i64 },

    /// At least `days` days have passed.
    ///
    /// Counts from the step becoming Ready, or from quest activation when
    /// `from_activation` is set.
    TimePassed {
        days: u32,
        #[serde(default)]
        from_activation: bool,
        #[serde(default)]
        started: Option<DayKey>,
    },

    /// The die roll of this event is `at_most` or lower.
    DieRoll { at_most: u8 },

    /// This event produced `result` on `table`.
    TableResult { table: String, result: String },

    /// This event searched `target`.
    Search { target: String },

    /// The character stands at a quest location.
    Location { location: EntityId },

    /// The character holds (escorts) a minor character.
    MinorCharacter { minor: EntityId },

    /// Evaluated by the host.
    Custom { key: String },
}

impl Requirement {
    /// Pure elapsed-time kinds.
    #[must_use]
    pub fn is_time_passed(&self) -> bool {
        matches!(self, Self::TimePassed { .. })
    }

    /// Called on every requirement when the quest becomes Active.
    pub fn activate(&mut self, character: &dyn QuestCharacter) {
        if let Self::TimePassed {
            from_activation: true,
            started,
            ..
        } = self
        {
            *started = Some(character.current_day());
        }
    }

    #[must_use]
    pub fn uses_minor_character(&self, id: EntityId) -> bool {
        matches!(self, Self::MinorCharacter { minor } if *minor == id)
    }

    #[must_use]
    pub fn uses_location(&self, id: EntityId) -> bool {
        matches!(self, Self::Location { location } if *location == id)
    }

    /// Rewrite entity references after a copy.
    pub fn update_ids(&mut self, map: &IdMap) -> Result<()> {
        match self {
            Self::Location { location } => *location = map.resolve(*location)?,
            Self::MinorCharacter { minor } => *minor = map.resolve(*minor)?,
            _ => {}
        }
        Ok(())
    }

    /// Drop per-instance progress.
    pub fn reset(&mut self) {
        if let Self::TimePassed { started, .. } = self {
            *started = None;
        }
    }

    /// Short text for journals and diagrams.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Active => "Quest is active".to_string(),
            Self::Attribute { key, min } => format!("{key} at least {min}"),
            Self::TimePassed { days, .. } => format!("{days} days pass"),
            Self::DieRoll { at_most } => format!("Roll {at_most} or less"),
            Self::TableResult { table, result } => format!("{table}: {result}"),
            Self::Search { target } => format!("Search {target}"),
            Self::Location { location } => format!("Visit {location}"),
            Self::MinorCharacter { minor } => format!("Escort {minor}"),
            Self::Custom { key } => key.clone(),
        }
    }
}

/// Everything a requirement can look at while it is evaluated.
pub struct RequirementContext<'a, 'h> {
    pub character: &'a dyn QuestCharacter,
    pub params: &'a RequirementParams,
    pub quest_state: QuestState,
    /// When the owning step last became Ready.
    pub step_ready_day: Option<DayKey>,
    pub locations: &'a mut [QuestLocation],
    pub minor_characters: &'a [MinorCharacter],
    pub hooks: &'a mut QuestHooks<'h>,
}

/// Evaluator for requirements.
pub struct RequirementEvaluator;

impl RequirementEvaluator {
    /// Check if a requirement is satisfied. May record side effects (a `Lock`
    /// location locking, a custom evaluator journaling).
    pub fn evaluate(requirement: &Requirement, ctx: &mut RequirementContext) -> bool {
        let params = ctx.params;
        match requirement {
            Requirement::Active => ctx.quest_state == QuestState::Active,

            Requirement::Attribute { key, min } => ctx.character.get_state(key, 0) >= *min,

            Requirement::TimePassed {
                days,
                from_activation,
                started,
            } => {
                let since = if *from_activation { *started } else { ctx.step_ready_day };
                since.is_some_and(|day| params.day.days_since(day) >= i64::from(*days))
            }

            Requirement::DieRoll { at_most } => params.die_roll.is_some_and(|roll| roll <= *at_most),

            Requirement::TableResult { table, result } => {
                params.table_result.as_ref().is_some_and(|outcome| {
                    outcome.table.eq_ignore_ascii_case(table)
                        && outcome.result.eq_ignore_ascii_case(result)
                })
            }

            Requirement::Search { target } => params
                .search_target
                .as_deref()
                .is_some_and(|searched| searched.eq_ignore_ascii_case(target)),

            Requirement::Location { location } => {
                let Some(position) = ctx.character.current_position() else {
                    return false;
                };
                let Some(quest_location) = ctx.locations.iter_mut().find(|l| l.id == *location)
                else {
                    return false;
                };
                if quest_location.matches(position) {
                    quest_location.lock_on_visit(position);
                    true
                } else {
                    false
                }
            }

            Requirement::MinorCharacter { minor } => ctx
                .minor_characters
                .iter()
                .find(|mc| mc.id == *minor)
                .is_some_and(|mc| ctx.character.holds(&mc.name)),

            Requirement::Custom { key } => ctx.hooks.eval_custom(key, ctx.character, params),
        }
    }
}
