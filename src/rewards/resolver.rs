//! Reward resolution - applying a finished step's rewards.
//!
//! The `RewardResolver` touches three things: the character (state values,
//! escorted minor characters), the quest (journal, lifecycle state, step
//! states) and, for `Custom` rewards, whatever the host's handler touches.

use log::{debug, info, warn};

use crate::core::{DayKey, EntityId, GameRng, QuestCharacter};
use crate::error::Result;
use crate::hooks::QuestHooks;
use crate::interaction::{ChoiceOption, Interaction};
use crate::quests::{Quest, QuestState, StepState};

use super::{Reward, RewardKind};

/// Where a reward is being paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardContext {
    /// The step that just finished.
    pub step: EntityId,
    pub day: DayKey,
}

/// Result of applying one reward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewardOutcome {
    Applied,
    /// Nothing to do (no candidate, no selection, unknown reference).
    Skipped(String),
}

/// Applies rewards to a quest and its owner.
pub struct RewardResolver;

impl RewardResolver {
    /// Apply a single reward.
    pub fn apply(
        quest: &mut Quest,
        reward: &Reward,
        ctx: &RewardContext,
        character: &mut dyn QuestCharacter,
        rng: &mut GameRng,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<RewardOutcome> {
        debug!("Quest '{}': reward {}", quest.title, reward.describe());

        match &reward.kind {
            RewardKind::Attribute { key, delta } => {
                character.modify_state(key, *delta);
            }

            RewardKind::Journal { key, text } => {
                quest.journal.write(key.clone(), ctx.day, text.clone());
            }

            RewardKind::MinorCharacter { minor, gain } => {
                let Some(name) = quest.minor_character(*minor).map(|mc| mc.name.clone()) else {
                    warn!("Quest '{}': reward names unknown minor character {}", quest.title, minor);
                    return Ok(RewardOutcome::Skipped(format!("no minor character {minor}")));
                };
                if *gain {
                    character.hold(&name);
                } else {
                    character.release(&name);
                }
            }

            RewardKind::QuestComplete | RewardKind::QuestFailed => {
                if quest.state.is_finished() {
                    info!(
                        "Quest '{}' already {}: ignoring {}",
                        quest.title,
                        quest.state,
                        reward.describe()
                    );
                    return Ok(RewardOutcome::Skipped(format!("quest already {}", quest.state)));
                }
                let state = if reward.kind == RewardKind::QuestComplete {
                    QuestState::Complete
                } else {
                    QuestState::Failed
                };
                quest.set_state(state, ctx.day, &*character)?;
            }

            RewardKind::ChooseNextStep => {
                return Ok(Self::choose_next_step(quest, ctx, rng, &mut *hooks.interaction));
            }

            RewardKind::Custom { key } => {
                hooks.apply_custom(key, character);
            }
        }

        Ok(RewardOutcome::Applied)
    }

    /// Offer the Pending steps that depend on the finished step. The chosen
    /// one becomes Ready and the rest fail.
    ///
    /// Declining the choice restricts nothing: the candidates stay Pending
    /// and the readiness pass that follows the rewards unlocks each one
    /// whose dependencies are met.
    fn choose_next_step(
        quest: &mut Quest,
        ctx: &RewardContext,
        rng: &mut GameRng,
        interaction: &mut dyn Interaction,
    ) -> RewardOutcome {
        let candidates: Vec<usize> = quest
            .steps()
            .iter()
            .enumerate()
            .filter(|(_, step)| {
                step.state == StepState::Pending && step.required_steps.contains(&ctx.step)
            })
            .map(|(index, _)| index)
            .collect();

        let chosen = match candidates.as_slice() {
            [] => return RewardOutcome::Skipped("no dependent step".to_string()),
            [only] => Some(*only),
            _ => {
                let options: Vec<_> = candidates
                    .iter()
                    .map(|&index| ChoiceOption::new(quest.steps()[index].name.clone()))
                    .collect();
                interaction
                    .choose_one("Choose the next step", &options)
                    .and_then(|picked| candidates.get(picked).copied())
            }
        };

        let Some(chosen) = chosen else {
            info!("Quest '{}': no next step selected", quest.title);
            return RewardOutcome::Skipped("no selection".to_string());
        };

        for &index in &candidates {
            if index != chosen {
                quest.set_step_state(index, StepState::Failed, ctx.day);
            }
        }
        quest.mark_step_ready(chosen, ctx.day, rng, interaction);
        RewardOutcome::Applied
    }
}
