//! Quest steps.
//!
//! A step is one node of the quest's dependency graph. It carries three edge
//! sets, all naming sibling steps by key:
//!
//! - `required_steps`: combined with `logic_type`, gates readiness
//! - `fail_steps`: the step becomes Ready when one of these fails its check
//! - `preempt_steps`: forced to Failed when this step finishes
//!
//! plus its own requirements (combined with `req_type`) and rewards.

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{DayKey, EntityId, IdMap, QuestCharacter};
use crate::error::Result;
use crate::hooks::QuestHooks;
use crate::interaction::{ChoiceOption, Interaction};
use crate::requirements::{Requirement, RequirementContext, RequirementEvaluator, RequirementParams};
use crate::rewards::{Reward, RewardGroup};

use super::{LogicType, MinorCharacter, QuestLocation, QuestState, StateStamps, StepState};

/// Edges to sibling steps. Most steps have one or two.
pub type StepEdges = SmallVec<[EntityId; 4]>;

/// One node in a quest's step graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStep {
    /// Stable key. Edges refer to steps by key.
    pub key: EntityId,

    /// Display number, 1..N by position in the quest.
    #[serde(default)]
    pub id: u32,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub state: StepState,

    #[serde(default)]
    pub state_days: StateStamps<StepState>,

    /// How `required_steps` combine.
    #[serde(default)]
    pub logic_type: LogicType,

    /// How `requirements` combine.
    #[serde(default)]
    pub req_type: LogicType,

    #[serde(default)]
    pub required_steps: StepEdges,

    #[serde(default)]
    pub fail_steps: StepEdges,

    #[serde(default)]
    pub preempt_steps: StepEdges,

    #[serde(default)]
    pub requirements: Vec<Requirement>,

    #[serde(default)]
    pub rewards: Vec<Reward>,
}

fn push_unique(edges: &mut StepEdges, key: EntityId) {
    if !edges.contains(&key) {
        edges.push(key);
    }
}

impl QuestStep {
    pub fn new(key: EntityId, name: impl Into<String>) -> Self {
        Self {
            key,
            id: 0,
            name: name.into(),
            description: String::new(),
            state: StepState::None,
            state_days: StateStamps::default(),
            logic_type: LogicType::And,
            req_type: LogicType::And,
            required_steps: StepEdges::new(),
            fail_steps: StepEdges::new(),
            preempt_steps: StepEdges::new(),
            requirements: Vec::new(),
            rewards: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_logic(mut self, logic: LogicType) -> Self {
        self.logic_type = logic;
        self
    }

    #[must_use]
    pub fn with_req_type(mut self, logic: LogicType) -> Self {
        self.req_type = logic;
        self
    }

    #[must_use]
    pub fn requires(mut self, step: EntityId) -> Self {
        self.add_required(step);
        self
    }

    #[must_use]
    pub fn fails_on(mut self, step: EntityId) -> Self {
        self.add_fail(step);
        self
    }

    #[must_use]
    pub fn preempts(mut self, step: EntityId) -> Self {
        self.add_preempt(step);
        self
    }

    #[must_use]
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    #[must_use]
    pub fn with_reward(mut self, reward: Reward) -> Self {
        self.rewards.push(reward);
        self
    }

    pub fn add_required(&mut self, step: EntityId) {
        push_unique(&mut self.required_steps, step);
    }

    pub fn add_fail(&mut self, step: EntityId) {
        push_unique(&mut self.fail_steps, step);
    }

    pub fn add_preempt(&mut self, step: EntityId) {
        push_unique(&mut self.preempt_steps, step);
    }

    /// Drop every edge that points at `step`. Returns the number removed.
    pub fn remove_edges_to(&mut self, step: EntityId) -> usize {
        self.retain_edges(|key| key != step)
    }

    /// Keep only edges for which `keep` holds. Returns the number removed.
    pub fn retain_edges(&mut self, mut keep: impl FnMut(EntityId) -> bool) -> usize {
        let before = self.edge_count();
        self.required_steps.retain(|key| keep(*key));
        self.fail_steps.retain(|key| keep(*key));
        self.preempt_steps.retain(|key| keep(*key));
        before - self.edge_count()
    }

    fn edge_count(&self) -> usize {
        self.required_steps.len() + self.fail_steps.len() + self.preempt_steps.len()
    }

    /// Required and fail-trigger edges: the steps this one waits on.
    pub fn dependencies(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.required_steps
            .iter()
            .chain(self.fail_steps.iter())
            .copied()
    }

    pub fn set_state(&mut self, state: StepState, day: DayKey) {
        debug!("Step {} '{}': {} -> {}", self.id, self.name, self.state, state);
        self.state = state;
        self.state_days.stamp(state, day);
    }

    /// When this step last became Ready.
    #[must_use]
    pub fn ready_day(&self) -> Option<DayKey> {
        self.state_days.get(StepState::Ready)
    }

    /// Locations named by this step's requirements.
    pub fn location_refs(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.requirements.iter().filter_map(|req| match req {
            Requirement::Location { location } => Some(*location),
            _ => None,
        })
    }

    /// Readiness from the states of sibling steps.
    ///
    /// AND needs every required step Finished. OR needs one, or an empty
    /// required set. A step with fail-trigger edges is never made ready this
    /// way; it waits for one of those steps to fail its check.
    #[must_use]
    pub fn dependencies_met(&self, steps: &[QuestStep]) -> bool {
        if !self.fail_steps.is_empty() {
            return false;
        }
        let finished = |key: &EntityId| {
            steps
                .iter()
                .find(|step| step.key == *key)
                .is_some_and(|step| step.state == StepState::Finished)
        };
        match self.logic_type {
            LogicType::And => self.required_steps.iter().all(finished),
            LogicType::Or => self.required_steps.is_empty() || self.required_steps.iter().any(finished),
        }
    }

    /// Check this step's requirements.
    ///
    /// Every requirement is evaluated, even after the outcome is known, so
    /// requirements with side effects (locking a location) always run. When
    /// an AND set fails on something other than elapsed time, the Ready stamp
    /// moves to today and time-based requirements start counting again.
    pub fn fulfills_requirements(
        &mut self,
        character: &dyn QuestCharacter,
        params: &RequirementParams,
        quest_state: QuestState,
        locations: &mut [QuestLocation],
        minor_characters: &[MinorCharacter],
        hooks: &mut QuestHooks<'_>,
    ) -> bool {
        if self.requirements.is_empty() {
            return true;
        }

        let mut ctx = RequirementContext {
            character,
            params,
            quest_state,
            step_ready_day: self.ready_day(),
            locations,
            minor_characters,
            hooks,
        };

        let results: Vec<bool> = self
            .requirements
            .iter()
            .map(|req| RequirementEvaluator::evaluate(req, &mut ctx))
            .collect();

        match self.req_type {
            LogicType::And => {
                let passed = results.iter().all(|ok| *ok);
                let reset_clock = self
                    .requirements
                    .iter()
                    .zip(&results)
                    .any(|(req, ok)| !ok && !req.is_time_passed());
                if !passed && reset_clock {
                    self.state_days.stamp(StepState::Ready, params.day);
                }
                passed
            }
            LogicType::Or => results.iter().any(|ok| *ok),
        }
    }

    /// Pick the rewards to apply when this step finishes.
    ///
    /// The `ALL` group is always included. With one other group it is taken
    /// automatically; with several the player chooses, and no selection
    /// means no optional rewards.
    pub fn select_rewards(&self, interaction: &mut dyn Interaction) -> Vec<Reward> {
        let mut groups: Vec<(&RewardGroup, Vec<&Reward>)> = Vec::new();
        for reward in self.rewards.iter().filter(|r| !r.group.is_all()) {
            match groups.iter().position(|(group, _)| *group == &reward.group) {
                Some(slot) => groups[slot].1.push(reward),
                None => groups.push((&reward.group, vec![reward])),
            }
        }

        let mut selected: Vec<Reward> = self
            .rewards
            .iter()
            .filter(|r| r.group.is_all())
            .cloned()
            .collect();

        let chosen = match groups.len() {
            0 => None,
            1 => Some(0),
            _ => {
                let options: Vec<_> = groups
                    .iter()
                    .map(|(group, rewards)| {
                        let text = rewards
                            .iter()
                            .map(|r| r.describe())
                            .collect::<Vec<_>>()
                            .join(", ");
                        let option = ChoiceOption::new(format!("{}: {}", group.name(), text));
                        match rewards.iter().find_map(|r| r.icon.clone()) {
                            Some(icon) => option.with_icon(icon),
                            None => option,
                        }
                    })
                    .collect();
                interaction.choose_one(&format!("Choose a reward for {}", self.name), &options)
            }
        };

        if let Some((_, rewards)) = chosen.and_then(|slot| groups.get(slot)) {
            selected.extend(rewards.iter().map(|r| (*r).clone()));
        }
        selected
    }

    /// Back to the pre-assignment state.
    pub fn reset(&mut self) {
        self.state = StepState::None;
        self.state_days.clear();
        for requirement in &mut self.requirements {
            requirement.reset();
        }
    }

    /// Rewrite every edge and reference after a copy. The step's own key is
    /// handled by the quest.
    pub fn update_ids(&mut self, map: &IdMap) -> Result<()> {
        map.remap_all(self.required_steps.iter_mut())?;
        map.remap_all(self.fail_steps.iter_mut())?;
        map.remap_all(self.preempt_steps.iter_mut())?;
        for requirement in &mut self.requirements {
            requirement.update_ids(map)?;
        }
        for reward in &mut self.rewards {
            reward.update_ids(map)?;
        }
        Ok(())
    }
}

/// Force every step named in `targets` to Failed.
pub fn preempt_steps(targets: &[EntityId], steps: &mut [QuestStep], day: DayKey) {
    for step in steps.iter_mut().filter(|s| targets.contains(&s.key)) {
        step.set_state(StepState::Failed, day);
    }
}
