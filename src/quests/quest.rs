//! The quest aggregate.
//!
//! A `Quest` owns its steps (kept in id order), locations, minor characters
//! and journal. Everything that references another entity does so by
//! `EntityId`, so a quest can be copied wholesale and remapped.
//!
//! ## Evaluation
//!
//! [`Quest::test_requirements`] is called once per game event. Each Ready
//! step checks its requirements; finishing a step preempts its alternatives,
//! pays out rewards and, once the pass ends, readiness is recomputed and the
//! quest is evaluated again with the die and table outcome cleared. The
//! cascade stops when a pass pays no reward.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::core::{
    CharacterId, DayKey, EntityId, GameRng, GameSettings, IdAllocator, IdMap, QuestCharacter,
};
use crate::error::{QuestError, Result};
use crate::hooks::QuestHooks;
use crate::interaction::Interaction;
use crate::layering::{layer_steps, LayerInput, StepLayout};
use crate::requirements::{Requirement, RequirementParams};
use crate::rewards::{RewardContext, RewardResolver};

use super::step::preempt_steps;
use super::{
    Journal, LostInventoryRule, MinorCharacter, QuestEligibility, QuestLocation, QuestState,
    QuestStep, StateStamps, StepState,
};

/// A quest template or live quest instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: EntityId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub state: QuestState,

    #[serde(default)]
    pub state_days: StateStamps<QuestState>,

    #[serde(default)]
    pub owner: Option<CharacterId>,

    /// Every player receives an independent copy.
    #[serde(default)]
    pub all_play: bool,

    /// Tracked while Assigned, without the owner activating it.
    #[serde(default)]
    pub secret: bool,

    /// Only offered when the host allows testing quests.
    #[serde(default)]
    pub testing: bool,

    /// Failed a structural check and is never offered.
    #[serde(default)]
    pub broken: bool,

    /// Some step waits for the owner to activate the quest.
    #[serde(default)]
    pub activatable: bool,

    #[serde(default)]
    pub is_template: bool,

    /// Shared by a template and every copy made from it.
    #[serde(default)]
    pub unique_id: Option<u32>,

    #[serde(default)]
    pub lost_inventory_rule: LostInventoryRule,

    #[serde(default)]
    pub lost_inventory_location: Option<EntityId>,

    #[serde(default)]
    pub eligibility: QuestEligibility,

    /// Kept sorted by step id.
    #[serde(default)]
    steps: Vec<QuestStep>,

    #[serde(default)]
    pub locations: Vec<QuestLocation>,

    #[serde(default)]
    pub minor_characters: Vec<MinorCharacter>,

    /// Host rule tags.
    #[serde(default)]
    pub rules: BTreeSet<String>,

    #[serde(default)]
    pub journal: Journal,

    #[serde(skip)]
    evaluating: bool,
}

impl Quest {
    pub fn new(id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            state: QuestState::New,
            state_days: StateStamps::default(),
            owner: None,
            all_play: false,
            secret: false,
            testing: false,
            broken: false,
            activatable: false,
            is_template: false,
            unique_id: None,
            lost_inventory_rule: LostInventoryRule::Default,
            lost_inventory_location: None,
            eligibility: QuestEligibility::default(),
            steps: Vec::new(),
            locations: Vec::new(),
            minor_characters: Vec::new(),
            rules: BTreeSet::new(),
            journal: Journal::new(),
            evaluating: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_all_play(mut self) -> Self {
        self.all_play = true;
        self
    }

    #[must_use]
    pub fn with_secret(mut self) -> Self {
        self.secret = true;
        self
    }

    #[must_use]
    pub fn with_testing(mut self) -> Self {
        self.testing = true;
        self
    }

    #[must_use]
    pub fn with_eligibility(mut self, eligibility: QuestEligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rules.insert(rule.into());
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: QuestStep) -> Self {
        self.add_step(step);
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: QuestLocation) -> Self {
        self.add_location(location);
        self
    }

    #[must_use]
    pub fn with_minor_character(mut self, minor: MinorCharacter) -> Self {
        self.add_minor_character(minor);
        self
    }

    // === Steps ===

    #[must_use]
    pub fn steps(&self) -> &[QuestStep] {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, key: EntityId) -> Option<&QuestStep> {
        self.steps.iter().find(|step| step.key == key)
    }

    pub fn step_mut(&mut self, key: EntityId) -> Option<&mut QuestStep> {
        self.steps.iter_mut().find(|step| step.key == key)
    }

    /// Step by display number.
    #[must_use]
    pub fn step_by_id(&self, id: u32) -> Option<&QuestStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    fn step_index(&self, key: EntityId) -> Result<usize> {
        self.steps
            .iter()
            .position(|step| step.key == key)
            .ok_or(QuestError::UnknownStep(key))
    }

    /// Append a step. Returns its key.
    pub fn add_step(&mut self, step: QuestStep) -> EntityId {
        let key = step.key;
        self.steps.push(step);
        self.renumber();
        key
    }

    /// Insert a step at `position` (clamped to the end).
    pub fn insert_step(&mut self, position: usize, step: QuestStep) -> EntityId {
        let key = step.key;
        let position = position.min(self.steps.len());
        self.steps.insert(position, step);
        self.renumber();
        key
    }

    /// Remove a step and every edge naming it.
    pub fn remove_step(&mut self, key: EntityId) -> Result<QuestStep> {
        let index = self.step_index(key)?;
        let removed = self.steps.remove(index);
        for step in &mut self.steps {
            step.remove_edges_to(key);
        }
        self.renumber();
        Ok(removed)
    }

    /// Move a step to `position` (clamped to the end).
    pub fn move_step(&mut self, key: EntityId, position: usize) -> Result<()> {
        let index = self.step_index(key)?;
        let step = self.steps.remove(index);
        let position = position.min(self.steps.len());
        self.steps.insert(position, step);
        self.renumber();
        Ok(())
    }

    fn renumber(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.id = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }
    }

    pub(crate) fn set_step_state(&mut self, index: usize, state: StepState, day: DayKey) {
        if let Some(step) = self.steps.get_mut(index) {
            step.set_state(state, day);
        }
    }

    // === Locations and minor characters ===

    /// Add a location. Returns its id.
    pub fn add_location(&mut self, location: QuestLocation) -> EntityId {
        let id = location.id;
        self.locations.push(location);
        id
    }

    #[must_use]
    pub fn location(&self, id: EntityId) -> Option<&QuestLocation> {
        self.locations.iter().find(|loc| loc.id == id)
    }

    #[must_use]
    pub fn location_by_name(&self, name: &str) -> Option<&QuestLocation> {
        self.locations
            .iter()
            .find(|loc| loc.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn uses_location(&self, id: EntityId) -> bool {
        self.lost_inventory_location == Some(id)
            || self
                .steps
                .iter()
                .flat_map(|step| step.requirements.iter())
                .any(|req| req.uses_location(id))
    }

    /// Does some requirement reference the location tagged `tag`?
    #[must_use]
    pub fn uses_location_tag(&self, tag: &str) -> bool {
        self.location_by_name(tag)
            .is_some_and(|loc| self.uses_location(loc.id))
    }

    /// Remove a location nothing references.
    pub fn remove_location(&mut self, id: EntityId) -> Result<QuestLocation> {
        let index = self
            .locations
            .iter()
            .position(|loc| loc.id == id)
            .ok_or(QuestError::UnknownLocation(id))?;
        if self.uses_location(id) {
            return Err(QuestError::InUse(id));
        }
        Ok(self.locations.remove(index))
    }

    pub fn add_minor_character(&mut self, minor: MinorCharacter) -> EntityId {
        let id = minor.id;
        self.minor_characters.push(minor);
        id
    }

    #[must_use]
    pub fn minor_character(&self, id: EntityId) -> Option<&MinorCharacter> {
        self.minor_characters.iter().find(|mc| mc.id == id)
    }

    #[must_use]
    pub fn uses_minor_character(&self, id: EntityId) -> bool {
        self.steps.iter().any(|step| {
            step.requirements.iter().any(|req| req.uses_minor_character(id))
                || step.rewards.iter().any(|reward| reward.uses_minor_character(id))
        })
    }

    /// Remove a minor character nothing references.
    pub fn remove_minor_character(&mut self, id: EntityId) -> Result<MinorCharacter> {
        let index = self
            .minor_characters
            .iter()
            .position(|mc| mc.id == id)
            .ok_or(QuestError::UnknownMinorCharacter(id))?;
        if self.uses_minor_character(id) {
            return Err(QuestError::InUse(id));
        }
        Ok(self.minor_characters.remove(index))
    }

    // === Lifecycle ===

    /// Move to `state` and stamp `day`.
    ///
    /// Entering Active activates every requirement. Re-entering the current
    /// state is a no-op. Finished quests only leave their state via `reset`.
    pub fn set_state(
        &mut self,
        state: QuestState,
        day: DayKey,
        character: &dyn QuestCharacter,
    ) -> Result<()> {
        if state == self.state {
            return Ok(());
        }
        let allowed = matches!(
            (self.state, state),
            (QuestState::New, QuestState::Assigned)
                | (QuestState::Assigned, QuestState::Active)
                | (
                    QuestState::New | QuestState::Assigned | QuestState::Active,
                    QuestState::Complete | QuestState::Failed
                )
        );
        if !allowed {
            return Err(QuestError::InvalidTransition {
                title: self.title.clone(),
                from: self.state.to_string(),
                to: state.to_string(),
            });
        }

        info!("Quest '{}': {} -> {} on {}", self.title, self.state, state, day);
        self.state = state;
        self.state_days.stamp(state, day);

        if state == QuestState::Active {
            for requirement in self.steps.iter_mut().flat_map(|s| s.requirements.iter_mut()) {
                requirement.activate(character);
            }
        }
        Ok(())
    }

    /// Fail an unfinished quest and detach it from its owner.
    pub(crate) fn revert(&mut self, day: DayKey) {
        if self.state.is_finished() {
            return;
        }
        info!("Quest '{}' reverted for {:?}", self.title, self.owner);
        self.state = QuestState::Failed;
        self.state_days.stamp(QuestState::Failed, day);
        self.owner = None;
    }

    /// Only an Assigned quest that is not all-play can go back to a deck.
    #[must_use]
    pub fn is_discardable(&self) -> bool {
        !self.all_play && self.state == QuestState::Assigned
    }

    /// Is this quest evaluated on game events?
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.state == QuestState::Active
            || ((self.all_play || self.secret) && self.state == QuestState::Assigned)
    }

    /// Prepare a quest for `character`: every step Pending, origins Ready,
    /// quest-start locations resolved.
    pub fn initialize(
        &mut self,
        character: &dyn QuestCharacter,
        rng: &mut GameRng,
        hooks: &mut QuestHooks<'_>,
    ) {
        let day = character.current_day();
        self.owner = Some(character.character_id());
        for step in &mut self.steps {
            step.set_state(StepState::Pending, day);
        }
        self.update_step_states(day, rng, &mut *hooks.interaction);
        for location in &mut self.locations {
            location.resolve_quest_start(rng, &mut *hooks.interaction);
        }
        debug!("Quest '{}' initialized for {}", self.title, character.name());
    }

    /// Back to template condition.
    pub fn reset(&mut self) {
        self.owner = None;
        self.state = QuestState::New;
        self.state_days.clear();
        self.journal.clear();
        self.evaluating = false;
        for step in &mut self.steps {
            step.reset();
        }
        for location in &mut self.locations {
            location.reset();
        }
    }

    /// Promote every Pending step whose dependencies are met.
    pub fn update_step_states(
        &mut self,
        day: DayKey,
        rng: &mut GameRng,
        interaction: &mut dyn Interaction,
    ) {
        let ready: Vec<usize> = self
            .steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.state == StepState::Pending && step.dependencies_met(&self.steps))
            .map(|(index, _)| index)
            .collect();
        for index in ready {
            self.mark_step_ready(index, day, rng, interaction);
        }
    }

    /// Make a step Ready and resolve the step-start locations it uses.
    pub(crate) fn mark_step_ready(
        &mut self,
        index: usize,
        day: DayKey,
        rng: &mut GameRng,
        interaction: &mut dyn Interaction,
    ) {
        let Some(step) = self.steps.get_mut(index) else {
            return;
        };
        step.set_state(StepState::Ready, day);
        let used: Vec<EntityId> = step.location_refs().collect();
        for location in self.locations.iter_mut().filter(|loc| used.contains(&loc.id)) {
            location.resolve_step_start(rng, interaction);
        }
    }

    /// Run one evaluation cascade for a game event.
    ///
    /// Returns whether any step finished. A quest that is not being tracked
    /// is left alone.
    pub fn test_requirements(
        &mut self,
        character: &mut dyn QuestCharacter,
        params: &RequirementParams,
        rng: &mut GameRng,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<bool> {
        if self.evaluating {
            return Err(QuestError::ReentrantEvaluation {
                title: self.title.clone(),
            });
        }
        self.evaluating = true;
        let result = self.evaluate_pass(character, params, rng, hooks);
        self.evaluating = false;
        result
    }

    fn evaluate_pass(
        &mut self,
        character: &mut dyn QuestCharacter,
        params: &RequirementParams,
        rng: &mut GameRng,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<bool> {
        if !self.is_tracking() {
            return Ok(false);
        }
        debug!("Quest '{}': evaluating on {}", self.title, params.day);

        let mut rewarded = false;
        for index in 0..self.steps.len() {
            if self.steps[index].state != StepState::Ready {
                continue;
            }

            let quest_state = self.state;
            let Quest {
                steps,
                locations,
                minor_characters,
                ..
            } = &mut *self;
            let passed = steps[index].fulfills_requirements(
                &*character,
                params,
                quest_state,
                locations,
                minor_characters,
                hooks,
            );

            if passed {
                let preempts = steps[index].preempt_steps.clone();
                preempt_steps(&preempts, steps, params.day);
                steps[index].set_state(StepState::Finished, params.day);
                info!("Quest '{}': step '{}' finished", self.title, self.steps[index].name);
                self.do_rewards(index, character, params.day, rng, hooks)?;
                rewarded = true;
                if !self.is_tracking() {
                    debug!("Quest '{}' is {}: evaluation stops", self.title, self.state);
                    break;
                }
            } else {
                let failed = steps[index].key;
                let unlocked: Vec<usize> = steps
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.state == StepState::Pending && s.fail_steps.contains(&failed))
                    .map(|(i, _)| i)
                    .collect();
                for i in unlocked {
                    self.mark_step_ready(i, params.day, rng, &mut *hooks.interaction);
                }
            }
        }

        if rewarded {
            self.update_step_states(params.day, rng, &mut *hooks.interaction);
            self.evaluate_pass(character, &params.cleared(), rng, hooks)?;
        }
        Ok(rewarded)
    }

    fn do_rewards(
        &mut self,
        index: usize,
        character: &mut dyn QuestCharacter,
        day: DayKey,
        rng: &mut GameRng,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<()> {
        let rewards = self.steps[index].select_rewards(&mut *hooks.interaction);
        let ctx = RewardContext {
            step: self.steps[index].key,
            day,
        };
        for reward in &rewards {
            RewardResolver::apply(self, reward, &ctx, character, rng, hooks)?;
        }
        Ok(())
    }

    // === Eligibility ===

    /// Character, board size and variant checks, AND'd.
    pub fn can_choose_quest(
        &self,
        character: &dyn QuestCharacter,
        settings: &GameSettings,
    ) -> Result<bool> {
        if self.broken {
            return Ok(false);
        }
        Ok(self.eligibility.settings_match(settings)
            && self.eligibility.character_matches(character)?)
    }

    // === Repair and copying ===

    /// Fix structural problems in a loaded quest. Returns the number of fixes.
    pub fn auto_repair(&mut self) -> usize {
        let keys: FxHashSet<EntityId> = self.steps.iter().map(|step| step.key).collect();
        let mut fixes = 0;

        for step in &mut self.steps {
            let own = step.key;
            let removed = step.retain_edges(|key| key != own && keys.contains(&key));
            if removed > 0 {
                warn!(
                    "Quest '{}': dropped {} dangling edge(s) from step '{}'",
                    self.title, removed, step.name
                );
                fixes += removed;
            }
        }

        let numbered = self
            .steps
            .iter()
            .enumerate()
            .all(|(index, step)| step.id as usize == index + 1);
        if !numbered {
            self.steps.sort_by_key(|step| step.id);
            self.renumber();
            fixes += 1;
        }

        if let Some(location) = self.lost_inventory_location {
            if self.location(location).is_none() {
                warn!("Quest '{}': lost inventory location {} is missing", self.title, location);
                self.lost_inventory_location = None;
                fixes += 1;
            }
        }

        let activatable = self
            .steps
            .iter()
            .any(|step| step.requirements.iter().any(|req| matches!(req, Requirement::Active)));
        if activatable != self.activatable {
            self.activatable = activatable;
            fixes += 1;
        }

        if !self.broken && self.has_dependency_cycle() {
            warn!("Quest '{}': step dependencies form a cycle, marking broken", self.title);
            self.broken = true;
            fixes += 1;
        }

        fixes
    }

    /// Do required and fail-trigger edges form a cycle?
    #[must_use]
    pub fn has_dependency_cycle(&self) -> bool {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unseen,
            Open,
            Done,
        }

        fn visit(
            index: usize,
            steps: &[QuestStep],
            lookup: &FxHashMap<EntityId, usize>,
            marks: &mut [Mark],
        ) -> bool {
            marks[index] = Mark::Open;
            for dep in steps[index].dependencies() {
                let Some(&next) = lookup.get(&dep) else {
                    continue;
                };
                let mark = marks[next];
                match mark {
                    Mark::Open => return true,
                    Mark::Unseen if visit(next, steps, lookup, marks) => return true,
                    _ => {}
                }
            }
            marks[index] = Mark::Done;
            false
        }

        let lookup: FxHashMap<EntityId, usize> = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| (step.key, index))
            .collect();
        let mut marks = vec![Mark::Unseen; self.steps.len()];
        (0..self.steps.len())
            .any(|index| marks[index] == Mark::Unseen && visit(index, &self.steps, &lookup, &mut marks))
    }

    /// Independent copy with fresh ids for the quest and everything in it.
    ///
    /// Every internal reference is remapped to the copy's own entities. The
    /// copy keeps `unique_id` and is never a template.
    pub fn deep_copy(&self, ids: &mut IdAllocator) -> Result<Quest> {
        let mut map = IdMap::new();
        let mut copy = self.clone();
        copy.is_template = false;
        copy.evaluating = false;

        copy.id = ids.next_id();
        map.insert(self.id, copy.id);
        for step in &mut copy.steps {
            let fresh = ids.next_id();
            map.insert(step.key, fresh);
            step.key = fresh;
        }
        for location in &mut copy.locations {
            let fresh = ids.next_id();
            map.insert(location.id, fresh);
            location.id = fresh;
        }
        for minor in &mut copy.minor_characters {
            let fresh = ids.next_id();
            map.insert(minor.id, fresh);
            minor.id = fresh;
        }

        for step in &mut copy.steps {
            step.update_ids(&map)?;
        }
        if let Some(location) = copy.lost_inventory_location {
            copy.lost_inventory_location = Some(map.resolve(location)?);
        }
        Ok(copy)
    }

    /// Rank the steps for a dependency diagram.
    #[must_use]
    pub fn layout(&self) -> StepLayout {
        let inputs: Vec<LayerInput> = self
            .steps
            .iter()
            .map(|step| LayerInput::new(step.key, step.dependencies()))
            .collect();
        layer_steps(&inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CharacterRecord, Gender};
    use crate::interaction::{NoChoice, ScriptedChoices};
    use crate::quests::LocationType;
    use crate::rewards::{Reward, RewardKind};

    fn hero() -> CharacterRecord {
        CharacterRecord::new(CharacterId::new(1), "Captain", Gender::Male).on_day(DayKey::new(1, 1))
    }

    fn point() -> Reward {
        Reward::new(RewardKind::Attribute {
            key: "points".to_string(),
            delta: 1,
        })
    }

    fn search(target: &str) -> Requirement {
        Requirement::Search {
            target: target.to_string(),
        }
    }

    fn start(quest: &mut Quest, character: &mut CharacterRecord, rng: &mut GameRng) {
        let mut chooser = NoChoice;
        let mut hooks = QuestHooks::new(&mut chooser);
        quest.initialize(character, rng, &mut hooks);
        quest.set_state(QuestState::Assigned, character.current_day(), character).unwrap();
        quest.set_state(QuestState::Active, character.current_day(), character).unwrap();
    }

    fn evaluate(
        quest: &mut Quest,
        character: &mut CharacterRecord,
        params: &RequirementParams,
        rng: &mut GameRng,
    ) -> bool {
        let mut chooser = NoChoice;
        let mut hooks = QuestHooks::new(&mut chooser);
        quest.test_requirements(character, params, rng, &mut hooks).unwrap()
    }

    #[test]
    fn test_steps_renumbered() {
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(QuestStep::new(EntityId(10), "A"))
            .with_step(QuestStep::new(EntityId(11), "B"));
        quest.insert_step(0, QuestStep::new(EntityId(12), "C"));
        let names: Vec<_> = quest.steps().iter().map(|s| (s.id, s.name.as_str())).collect();
        assert_eq!(names, vec![(1, "C"), (2, "A"), (3, "B")]);

        quest.move_step(EntityId(12), 5).unwrap();
        assert_eq!(quest.step_by_id(3).unwrap().name, "C");

        assert!(matches!(
            quest.move_step(EntityId(99), 0),
            Err(QuestError::UnknownStep(_))
        ));
    }

    #[test]
    fn test_remove_step_drops_edges() {
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(QuestStep::new(EntityId(10), "A"))
            .with_step(QuestStep::new(EntityId(11), "B").requires(EntityId(10)));
        quest.remove_step(EntityId(10)).unwrap();
        assert!(quest.steps()[0].required_steps.is_empty());
        assert_eq!(quest.steps()[0].id, 1);
    }

    #[test]
    fn test_state_transitions() {
        let character = hero();
        let day = DayKey::first();
        let mut quest = Quest::new(EntityId(1), "Q");

        assert!(quest.set_state(QuestState::Active, day, &character).is_err());
        quest.set_state(QuestState::Assigned, day, &character).unwrap();
        assert!(quest.is_discardable());
        quest.set_state(QuestState::Active, day, &character).unwrap();
        assert!(!quest.is_discardable());
        quest.set_state(QuestState::Complete, day, &character).unwrap();
        quest.set_state(QuestState::Complete, day, &character).unwrap();
        assert!(matches!(
            quest.set_state(QuestState::Failed, day, &character),
            Err(QuestError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_activation_starts_timers() {
        let character = hero().on_day(DayKey::new(1, 3));
        let mut quest = Quest::new(EntityId(1), "Q").with_step(
            QuestStep::new(EntityId(10), "Wait").with_requirement(Requirement::TimePassed {
                days: 1,
                from_activation: true,
                started: None,
            }),
        );
        quest.set_state(QuestState::Assigned, DayKey::new(1, 3), &character).unwrap();
        quest.set_state(QuestState::Active, DayKey::new(1, 3), &character).unwrap();
        assert_eq!(
            quest.steps()[0].requirements[0],
            Requirement::TimePassed {
                days: 1,
                from_activation: true,
                started: Some(DayKey::new(1, 3)),
            }
        );
    }

    #[test]
    fn test_end_to_end_cascade() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(
                QuestStep::new(EntityId(10), "S1")
                    .with_requirement(search("Crypt"))
                    .with_reward(point()),
            )
            .with_step(QuestStep::new(EntityId(11), "S2").requires(EntityId(10)));

        start(&mut quest, &mut character, &mut rng);
        assert_eq!(quest.steps()[0].state, StepState::Ready);
        assert_eq!(quest.steps()[1].state, StepState::Pending);

        let miss = RequirementParams::new(DayKey::new(1, 2)).with_search_target("Cave");
        assert!(!evaluate(&mut quest, &mut character, &miss, &mut rng));

        let hit = RequirementParams::new(DayKey::new(1, 2)).with_search_target("Crypt");
        assert!(evaluate(&mut quest, &mut character, &hit, &mut rng));
        assert_eq!(character.get_state("points", 0), 1);
        assert_eq!(quest.steps()[0].state, StepState::Finished);
        // S2 has no requirements, so the cascade finishes it too.
        assert_eq!(quest.steps()[1].state, StepState::Finished);
    }

    #[test]
    fn test_die_roll_consumed_once() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let roll = Requirement::DieRoll { at_most: 3 };
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(QuestStep::new(EntityId(10), "First").with_requirement(roll.clone()))
            .with_step(
                QuestStep::new(EntityId(11), "Second")
                    .requires(EntityId(10))
                    .with_requirement(roll),
            );
        start(&mut quest, &mut character, &mut rng);

        let params = RequirementParams::new(DayKey::new(1, 2)).with_die_roll(2);
        assert!(evaluate(&mut quest, &mut character, &params, &mut rng));
        assert_eq!(quest.steps()[0].state, StepState::Finished);
        assert_eq!(quest.steps()[1].state, StepState::Ready);
    }

    #[test]
    fn test_fail_trigger_unlocks_step() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(QuestStep::new(EntityId(10), "Try").with_requirement(search("Crypt")))
            .with_step(
                QuestStep::new(EntityId(11), "Fallback")
                    .fails_on(EntityId(10))
                    .with_requirement(search("Exit")),
            );
        start(&mut quest, &mut character, &mut rng);
        assert_eq!(quest.steps()[1].state, StepState::Pending);

        let params = RequirementParams::new(DayKey::new(1, 2));
        assert!(!evaluate(&mut quest, &mut character, &params, &mut rng));
        assert_eq!(quest.steps()[0].state, StepState::Ready);
        assert_eq!(quest.steps()[1].state, StepState::Ready);
    }

    #[test]
    fn test_preempt_fails_alternative() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(
                QuestStep::new(EntityId(10), "North")
                    .with_requirement(search("North"))
                    .preempts(EntityId(11)),
            )
            .with_step(QuestStep::new(EntityId(11), "South").with_requirement(search("South")));
        start(&mut quest, &mut character, &mut rng);

        let params = RequirementParams::new(DayKey::new(1, 2)).with_search_target("North");
        assert!(evaluate(&mut quest, &mut character, &params, &mut rng));
        assert_eq!(quest.steps()[0].state, StepState::Finished);
        assert_eq!(quest.steps()[1].state, StepState::Failed);
    }

    #[test]
    fn test_choose_next_step_reward() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(
                QuestStep::new(EntityId(10), "Crossroads")
                    .with_requirement(search("Crossroads"))
                    .with_reward(Reward::new(RewardKind::ChooseNextStep)),
            )
            .with_step(
                QuestStep::new(EntityId(11), "Left")
                    .requires(EntityId(10))
                    .with_requirement(search("Left")),
            )
            .with_step(
                QuestStep::new(EntityId(12), "Right")
                    .requires(EntityId(10))
                    .with_requirement(search("Right")),
            );
        start(&mut quest, &mut character, &mut rng);

        let mut chooser = ScriptedChoices::new([Some(1)]);
        let mut hooks = QuestHooks::new(&mut chooser);
        let params = RequirementParams::new(DayKey::new(1, 2)).with_search_target("Crossroads");
        assert!(quest
            .test_requirements(&mut character, &params, &mut rng, &mut hooks)
            .unwrap());
        drop(hooks);

        assert_eq!(quest.steps()[1].state, StepState::Failed);
        assert_eq!(quest.steps()[2].state, StepState::Ready);
        assert_eq!(chooser.asked[0].1.len(), 2);
    }

    #[test]
    fn test_declined_next_step_unlocks_every_branch() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(
                QuestStep::new(EntityId(10), "Crossroads")
                    .with_requirement(search("Crossroads"))
                    .with_reward(Reward::new(RewardKind::ChooseNextStep)),
            )
            .with_step(
                QuestStep::new(EntityId(11), "Left")
                    .requires(EntityId(10))
                    .with_requirement(search("Left")),
            )
            .with_step(
                QuestStep::new(EntityId(12), "Right")
                    .requires(EntityId(10))
                    .with_requirement(search("Right")),
            );
        start(&mut quest, &mut character, &mut rng);

        let params = RequirementParams::new(DayKey::new(1, 2)).with_search_target("Crossroads");
        assert!(evaluate(&mut quest, &mut character, &params, &mut rng));

        assert_eq!(quest.steps()[0].state, StepState::Finished);
        assert_eq!(quest.steps()[1].state, StepState::Ready);
        assert_eq!(quest.steps()[2].state, StepState::Ready);
    }

    #[test]
    fn test_not_tracked_is_noop() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest =
            Quest::new(EntityId(1), "Q").with_step(QuestStep::new(EntityId(10), "Free"));
        let mut chooser = NoChoice;
        let mut hooks = QuestHooks::new(&mut chooser);
        quest.initialize(&character, &mut rng, &mut hooks);
        let params = RequirementParams::new(DayKey::first());
        assert!(!quest
            .test_requirements(&mut character, &params, &mut rng, &mut hooks)
            .unwrap());
        assert_eq!(quest.steps()[0].state, StepState::Ready);
    }

    #[test]
    fn test_secret_quest_tracked_while_assigned() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_secret()
            .with_step(QuestStep::new(EntityId(10), "Free").with_reward(point()));
        let mut chooser = NoChoice;
        let mut hooks = QuestHooks::new(&mut chooser);
        quest.initialize(&character, &mut rng, &mut hooks);
        quest.set_state(QuestState::Assigned, DayKey::first(), &character).unwrap();
        let params = RequirementParams::new(DayKey::first());
        assert!(quest
            .test_requirements(&mut character, &params, &mut rng, &mut hooks)
            .unwrap());
        assert_eq!(character.get_state("points", 0), 1);
    }

    #[test]
    fn test_quest_complete_reward() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q").with_step(
            QuestStep::new(EntityId(10), "End")
                .with_reward(Reward::new(RewardKind::QuestComplete))
                .with_reward(Reward::new(RewardKind::Journal {
                    key: "end".to_string(),
                    text: "Done".to_string(),
                })),
        );
        start(&mut quest, &mut character, &mut rng);
        let params = RequirementParams::new(DayKey::new(1, 4));
        assert!(evaluate(&mut quest, &mut character, &params, &mut rng));
        assert_eq!(quest.state, QuestState::Complete);
        assert_eq!(quest.state_days.get(QuestState::Complete), Some(DayKey::new(1, 4)));
        assert_eq!(quest.journal.get("end").unwrap().text, "Done");
    }

    #[test]
    fn test_step_locations_resolve_when_ready() {
        let mut rng = GameRng::new(9);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_location(
                QuestLocation::new(EntityId(20), "Tomb", LocationType::StepRandom)
                    .with_choice("Cavern 4"),
            )
            .with_location(
                QuestLocation::new(EntityId(21), "Camp", LocationType::QuestRandom)
                    .with_choice("Ledges 2"),
            )
            .with_step(QuestStep::new(EntityId(10), "First").with_requirement(search("x")))
            .with_step(
                QuestStep::new(EntityId(11), "Visit")
                    .requires(EntityId(10))
                    .with_requirement(Requirement::Location {
                        location: EntityId(20),
                    }),
            );
        start(&mut quest, &mut character, &mut rng);
        assert!(quest.location(EntityId(21)).unwrap().is_locked());
        assert!(!quest.location(EntityId(20)).unwrap().is_locked());

        let params = RequirementParams::new(DayKey::first()).with_search_target("x");
        evaluate(&mut quest, &mut character, &params, &mut rng);
        assert_eq!(
            quest.location(EntityId(20)).unwrap().lock_address.as_deref(),
            Some("Cavern 4")
        );
    }

    #[test]
    fn test_remove_referenced_location_refused() {
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_location(QuestLocation::new(EntityId(20), "Tomb", LocationType::Any))
            .with_location(QuestLocation::new(EntityId(21), "Spare", LocationType::Any))
            .with_step(QuestStep::new(EntityId(10), "Visit").with_requirement(
                Requirement::Location {
                    location: EntityId(20),
                },
            ));
        assert!(quest.uses_location_tag("tomb"));
        assert!(!quest.uses_location_tag("Spare"));
        assert!(matches!(
            quest.remove_location(EntityId(20)),
            Err(QuestError::InUse(_))
        ));
        assert!(quest.remove_location(EntityId(21)).is_ok());
    }

    #[test]
    fn test_reentrant_evaluation_rejected() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q");
        quest.evaluating = true;
        let mut chooser = NoChoice;
        let mut hooks = QuestHooks::new(&mut chooser);
        let params = RequirementParams::new(DayKey::first());
        assert!(matches!(
            quest.test_requirements(&mut character, &params, &mut rng, &mut hooks),
            Err(QuestError::ReentrantEvaluation { .. })
        ));
    }

    #[test]
    fn test_auto_repair() {
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(
                QuestStep::new(EntityId(10), "A")
                    .requires(EntityId(99))
                    .with_requirement(Requirement::Active),
            )
            .with_step(QuestStep::new(EntityId(11), "B").requires(EntityId(10)));
        quest.lost_inventory_location = Some(EntityId(77));

        let fixes = quest.auto_repair();
        assert_eq!(fixes, 3);
        assert!(quest.steps()[0].required_steps.is_empty());
        assert!(quest.activatable);
        assert!(quest.lost_inventory_location.is_none());
        assert!(!quest.broken);
        assert_eq!(quest.auto_repair(), 0);
    }

    #[test]
    fn test_cycle_marks_broken() {
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(QuestStep::new(EntityId(10), "A").requires(EntityId(11)))
            .with_step(QuestStep::new(EntityId(11), "B").requires(EntityId(10)));
        assert!(quest.has_dependency_cycle());
        quest.auto_repair();
        assert!(quest.broken);
        assert!(!quest.can_choose_quest(&hero(), &GameSettings::default()).unwrap());
    }

    #[test]
    fn test_deep_copy_remaps_everything() {
        let mut ids = IdAllocator::starting_at(100);
        let mut template = Quest::new(EntityId(1), "Q")
            .with_location(QuestLocation::new(EntityId(20), "Tomb", LocationType::Any))
            .with_minor_character(MinorCharacter::new(EntityId(30), "Guide"))
            .with_step(QuestStep::new(EntityId(10), "A").preempts(EntityId(11)))
            .with_step(
                QuestStep::new(EntityId(11), "B")
                    .requires(EntityId(10))
                    .with_requirement(Requirement::Location {
                        location: EntityId(20),
                    })
                    .with_reward(Reward::new(RewardKind::MinorCharacter {
                        minor: EntityId(30),
                        gain: true,
                    })),
            );
        template.is_template = true;
        template.unique_id = Some(4);

        let mut copy = template.deep_copy(&mut ids).unwrap();
        assert!(!copy.is_template);
        assert_eq!(copy.unique_id, Some(4));
        assert_ne!(copy.id, template.id);

        let copy_keys: Vec<_> = copy.steps().iter().map(|s| s.key).collect();
        assert_eq!(copy.steps()[0].preempt_steps.as_slice(), &[copy_keys[1]]);
        assert_eq!(copy.steps()[1].required_steps.as_slice(), &[copy_keys[0]]);
        let location = copy.locations[0].id;
        let minor = copy.minor_characters[0].id;
        assert!(copy.uses_location(location));
        assert!(copy.uses_minor_character(minor));
        assert!(!copy.uses_location(EntityId(20)));

        copy.step_mut(copy_keys[0]).unwrap().state = StepState::Finished;
        assert_eq!(template.steps()[0].state, StepState::None);
    }

    #[test]
    fn test_deep_copy_dangling_reference_is_fatal() {
        let mut ids = IdAllocator::new();
        let quest = Quest::new(EntityId(1), "Q")
            .with_step(QuestStep::new(EntityId(10), "A").requires(EntityId(99)));
        assert!(matches!(
            quest.deep_copy(&mut ids),
            Err(QuestError::UnmappedReference { .. })
        ));
    }

    #[test]
    fn test_reset() {
        let mut rng = GameRng::new(1);
        let mut character = hero();
        let mut quest = Quest::new(EntityId(1), "Q")
            .with_step(QuestStep::new(EntityId(10), "A").with_reward(point()));
        start(&mut quest, &mut character, &mut rng);
        quest.journal.write("note", DayKey::first(), "text");

        quest.reset();
        assert_eq!(quest.owner, None);
        assert_eq!(quest.state, QuestState::New);
        assert!(quest.journal.is_empty());
        assert!(quest.state_days.is_empty());
        assert_eq!(quest.steps()[0].state, StepState::None);
    }
}
