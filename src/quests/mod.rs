//! Quests, their steps and the things steps refer to.
//!
//! - `Quest`: aggregate root, lifecycle and evaluation loop
//! - `QuestStep`: one node of the dependency graph
//! - `QuestLocation`: symbolic places, resolved to addresses
//! - `MinorCharacter`: named characters a quest hands out or asks for
//! - `Journal`: keyed notes written by rewards

mod attributes;
mod eligibility;
mod journal;
mod location;
mod minor;
mod quest;
mod state;
mod step;

pub use attributes::{AttributeKey, AttributeValue, Attributes};
pub use eligibility::QuestEligibility;
pub use journal::{Journal, JournalEntry};
pub use location::{LocationType, QuestLocation};
pub use minor::MinorCharacter;
pub use quest::Quest;
pub use state::{LogicType, LostInventoryRule, QuestState, StateStamps, StepState};
pub use step::{preempt_steps, QuestStep, StepEdges};
