//! Per-session quest store.
//!
//! A `QuestBook` owns every quest of a game session, templates and live
//! instances alike, together with the id allocator, the session RNG and the
//! host's rules. Decks, loaders and hosts all go through it.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::core::{
    CharacterId, EngineConfig, EntityId, GameRng, GameSettings, HostRules, IdAllocator,
    QuestCharacter,
};
use crate::error::{QuestError, Result};
use crate::hooks::QuestHooks;
use crate::quests::{Quest, QuestState};
use crate::requirements::RequirementParams;

/// Every quest of one game session.
pub struct QuestBook {
    quests: BTreeMap<EntityId, Quest>,

    ids: IdAllocator,

    /// Deterministic RNG for shuffles and random locations.
    pub rng: GameRng,

    pub rules: HostRules,

    pub settings: GameSettings,
}

impl QuestBook {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            quests: BTreeMap::new(),
            ids: IdAllocator::new(),
            rng: GameRng::new(seed),
            rules: HostRules::default(),
            settings: GameSettings::default(),
        }
    }

    /// Session using the rules and settings of `config`.
    #[must_use]
    pub fn from_config(config: &EngineConfig, seed: u64) -> Self {
        Self::new(seed)
            .with_rules(config.rules.clone())
            .with_settings(config.settings.clone())
    }

    #[must_use]
    pub fn with_rules(mut self, rules: HostRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings;
        self
    }

    // === Storage ===

    /// Allocate an id in this session's id space.
    pub fn next_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    /// Store a quest built with ids from [`QuestBook::next_id`].
    pub fn add_quest(&mut self, quest: Quest) -> EntityId {
        let id = quest.id;
        self.quests.insert(id, quest);
        id
    }

    /// Store a quest built elsewhere, re-keying it into this session.
    pub fn import(&mut self, quest: &Quest) -> Result<EntityId> {
        let copy = quest.deep_copy(&mut self.ids)?;
        Ok(self.add_quest(copy))
    }

    #[must_use]
    pub fn quest(&self, id: EntityId) -> Option<&Quest> {
        self.quests.get(&id)
    }

    pub fn quest_mut(&mut self, id: EntityId) -> Option<&mut Quest> {
        self.quests.get_mut(&id)
    }

    fn get_mut(&mut self, id: EntityId) -> Result<&mut Quest> {
        self.quests.get_mut(&id).ok_or(QuestError::UnknownQuest(id))
    }

    pub fn quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Independent copy of a stored quest. Returns the copy's id.
    pub fn copy_quest(&mut self, id: EntityId) -> Result<EntityId> {
        let copy = self
            .quests
            .get(&id)
            .ok_or(QuestError::UnknownQuest(id))?
            .deep_copy(&mut self.ids)?;
        Ok(self.add_quest(copy))
    }

    // === Lifecycle ===

    /// Hand a quest to `character`: owner set, steps initialized, Assigned.
    pub fn assign_quest(
        &mut self,
        id: EntityId,
        character: &dyn QuestCharacter,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<()> {
        let quest = self.quests.get_mut(&id).ok_or(QuestError::UnknownQuest(id))?;
        quest.initialize(character, &mut self.rng, hooks);
        quest.set_state(QuestState::Assigned, character.current_day(), character)
    }

    /// Copy an available quest and assign the copy. Returns the copy's id.
    pub fn choose_quest(
        &mut self,
        id: EntityId,
        character: &dyn QuestCharacter,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<EntityId> {
        let copy = self.copy_quest(id)?;
        self.assign_quest(copy, character, hooks)?;
        Ok(copy)
    }

    pub fn activate_quest(&mut self, id: EntityId, character: &dyn QuestCharacter) -> Result<()> {
        self.set_quest_state(id, QuestState::Active, character)
    }

    /// Change a quest's state. Completing an all-play quest may fail the
    /// other copies (see [`QuestBook::revert_all_play`]).
    pub fn set_quest_state(
        &mut self,
        id: EntityId,
        state: QuestState,
        character: &dyn QuestCharacter,
    ) -> Result<()> {
        let day = character.current_day();
        let quest = self.get_mut(id)?;
        let before = quest.state;
        quest.set_state(state, day, character)?;
        if before != QuestState::Complete && state == QuestState::Complete {
            self.revert_all_play(id, character);
        }
        Ok(())
    }

    /// Evaluate one quest for a game event.
    pub fn test_requirements(
        &mut self,
        id: EntityId,
        character: &mut dyn QuestCharacter,
        params: &RequirementParams,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<bool> {
        let quest = self.quests.get_mut(&id).ok_or(QuestError::UnknownQuest(id))?;
        let before = quest.state;
        let result = quest.test_requirements(character, params, &mut self.rng, hooks);
        if before != QuestState::Complete && quest.state == QuestState::Complete {
            self.revert_all_play(id, &*character);
        }
        result
    }

    /// Evaluate every quest owned by `character`. Returns whether any step
    /// finished.
    ///
    /// A quest that fails to evaluate does not stop the others; the first
    /// error is returned once every quest has been tried.
    pub fn test_character_quests(
        &mut self,
        character: &mut dyn QuestCharacter,
        params: &RequirementParams,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<bool> {
        let mut rewarded = false;
        let mut first_error = None;
        for id in self.quests_for(character.character_id()) {
            match self.test_requirements(id, character, params, hooks) {
                Ok(finished) => rewarded |= finished,
                Err(err) => {
                    warn!("Quest {} failed to evaluate: {}", id, err);
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(rewarded),
        }
    }

    /// When the single-completion rule is on and `completed` is an all-play
    /// quest, fail every other live copy sharing its unique id and detach it
    /// from its owner. Returns the number of copies reverted.
    pub fn revert_all_play(&mut self, completed: EntityId, character: &dyn QuestCharacter) -> usize {
        if !self.rules.all_play_single_completion {
            return 0;
        }
        let Some(unique_id) = self
            .quest(completed)
            .filter(|quest| quest.all_play)
            .and_then(|quest| quest.unique_id)
        else {
            return 0;
        };

        let day = character.current_day();
        let mut reverted = 0;
        for (id, quest) in &mut self.quests {
            if *id == completed
                || quest.is_template
                || quest.unique_id != Some(unique_id)
                || quest.state.is_finished()
            {
                continue;
            }
            quest.revert(day);
            reverted += 1;
        }
        if reverted > 0 {
            info!(
                "All-play quest {} completed by {}: reverted {} copies",
                completed,
                character.name(),
                reverted
            );
        }
        reverted
    }

    // === Queries ===

    /// Quests owned by `character`, in id order.
    #[must_use]
    pub fn quests_for(&self, character: CharacterId) -> Vec<EntityId> {
        self.quests
            .values()
            .filter(|quest| quest.owner == Some(character))
            .map(|quest| quest.id)
            .collect()
    }

    /// Owned quests that are neither Complete nor Failed.
    #[must_use]
    pub fn unfinished_count(&self, character: CharacterId) -> usize {
        self.quests
            .values()
            .filter(|quest| quest.owner == Some(character) && !quest.state.is_finished())
            .count()
    }

    /// Unowned, untouched quests `character` may choose.
    pub fn find_available_quests(&self, character: &dyn QuestCharacter) -> Result<Vec<EntityId>> {
        let mut available = Vec::new();
        for quest in self.quests.values() {
            if quest.owner.is_some()
                || quest.state != QuestState::New
                || quest.broken
                || (quest.testing && !self.rules.include_testing_quests)
            {
                continue;
            }
            if quest.can_choose_quest(character, &self.settings)? {
                available.push(quest.id);
            }
        }
        Ok(available)
    }
}
