//! Quest locations.
//!
//! A `QuestLocation` is a symbolic place a quest talks about ("the lost
//! city", "the monster's lair"). Depending on its type it is matched against
//! a fixed list of candidate addresses, or resolved once to one concrete
//! address that is then locked for the rest of the quest.
//!
//! | Type          | Resolution                                          |
//! |---------------|-----------------------------------------------------|
//! | `Any`         | none, any candidate matches                         |
//! | `Lock`        | the first candidate the character satisfies locks   |
//! | `QuestChoice` | player picks one candidate when the quest starts    |
//! | `StepChoice`  | player picks one when the owning step starts        |
//! | `QuestRandom` | random candidate when the quest starts              |
//! | `StepRandom`  | random candidate when the owning step starts        |

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::{tile_of, ClearingKind, EntityId, GameRng, Position, TileSide};
use crate::interaction::{ChoiceOption, Interaction};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    #[default]
    Any,
    Lock,
    QuestChoice,
    StepChoice,
    QuestRandom,
    StepRandom,
}

impl LocationType {
    /// Resolved once when the quest starts.
    #[must_use]
    pub fn resolves_at_quest_start(self) -> bool {
        matches!(self, Self::QuestChoice | Self::QuestRandom)
    }

    /// Resolved once when a step referencing the location starts.
    #[must_use]
    pub fn resolves_at_step_start(self) -> bool {
        matches!(self, Self::StepChoice | Self::StepRandom)
    }

    fn is_random(self) -> bool {
        matches!(self, Self::QuestRandom | Self::StepRandom)
    }
}

/// A symbolic location belonging to one quest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLocation {
    pub id: EntityId,

    /// The tag requirements and host text use for this location.
    pub name: String,

    pub location_type: LocationType,

    /// Candidate addresses. A bare tile name stands for every clearing on it.
    #[serde(default)]
    pub choice_addresses: Vec<String>,

    /// Address chosen for this quest instance, once resolved.
    #[serde(default)]
    pub lock_address: Option<String>,

    /// When locked, any clearing on the locked tile matches.
    #[serde(default)]
    pub same_tile: bool,

    #[serde(default)]
    pub clearing_filter: Option<ClearingKind>,

    #[serde(default)]
    pub tile_side_filter: Option<TileSide>,
}

impl QuestLocation {
    pub fn new(id: EntityId, name: impl Into<String>, location_type: LocationType) -> Self {
        Self {
            id,
            name: name.into(),
            location_type,
            choice_addresses: Vec::new(),
            lock_address: None,
            same_tile: false,
            clearing_filter: None,
            tile_side_filter: None,
        }
    }

    #[must_use]
    pub fn with_choice(mut self, address: impl Into<String>) -> Self {
        self.choice_addresses.push(address.into());
        self
    }

    #[must_use]
    pub fn with_same_tile(mut self) -> Self {
        self.same_tile = true;
        self
    }

    #[must_use]
    pub fn with_clearing_filter(mut self, clearing: ClearingKind) -> Self {
        self.clearing_filter = Some(clearing);
        self
    }

    #[must_use]
    pub fn with_tile_side_filter(mut self, side: TileSide) -> Self {
        self.tile_side_filter = Some(side);
        self
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_address.is_some()
    }

    /// Choice and random locations need an address before they can match.
    #[must_use]
    pub fn needs_resolution(&self) -> bool {
        !self.is_locked()
            && (self.location_type.resolves_at_quest_start()
                || self.location_type.resolves_at_step_start())
    }

    /// Permanently fix this location to `address`.
    pub fn lock_to(&mut self, address: impl Into<String>) {
        let address = address.into();
        info!("Quest location '{}' locked to {}", self.name, address);
        self.lock_address = Some(address);
    }

    /// Resolve a quest-start location. Returns true if it is now locked.
    pub fn resolve_quest_start(
        &mut self,
        rng: &mut GameRng,
        interaction: &mut dyn Interaction,
    ) -> bool {
        if self.location_type.resolves_at_quest_start() && self.needs_resolution() {
            self.resolve(rng, interaction);
        }
        self.is_locked()
    }

    /// Resolve a step-start location. Returns true if it is now locked.
    pub fn resolve_step_start(
        &mut self,
        rng: &mut GameRng,
        interaction: &mut dyn Interaction,
    ) -> bool {
        if self.location_type.resolves_at_step_start() && self.needs_resolution() {
            self.resolve(rng, interaction);
        }
        self.is_locked()
    }

    fn resolve(&mut self, rng: &mut GameRng, interaction: &mut dyn Interaction) {
        let picked = if self.location_type.is_random() {
            rng.choose(&self.choice_addresses).cloned()
        } else {
            let options: Vec<_> = self
                .choice_addresses
                .iter()
                .map(ChoiceOption::new)
                .collect();
            let prompt = format!("Choose a location for {}", self.name);
            interaction
                .choose_one(&prompt, &options)
                .and_then(|index| self.choice_addresses.get(index).cloned())
        };

        match picked {
            Some(address) => self.lock_to(address),
            None => info!("Quest location '{}' left unresolved", self.name),
        }
    }

    /// Does a character standing at `position` satisfy this location?
    #[must_use]
    pub fn matches(&self, position: &Position) -> bool {
        if let Some(clearing) = self.clearing_filter {
            if position.clearing != Some(clearing) {
                return false;
            }
        }
        if let Some(side) = self.tile_side_filter {
            if position.side != side {
                return false;
            }
        }

        match &self.lock_address {
            Some(lock) if self.same_tile => tile_of(lock).eq_ignore_ascii_case(position.tile()),
            Some(lock) => address_matches(lock, position),
            None => match self.location_type {
                LocationType::Any | LocationType::Lock => self
                    .choice_addresses
                    .iter()
                    .any(|candidate| address_matches(candidate, position)),
                _ => false,
            },
        }
    }

    /// Lock a `Lock` location to the position that just satisfied it.
    pub fn lock_on_visit(&mut self, position: &Position) {
        if self.location_type == LocationType::Lock && !self.is_locked() && self.matches(position) {
            self.lock_to(position.address.clone());
        }
    }

    /// Forget any resolved address.
    pub fn reset(&mut self) {
        self.lock_address = None;
    }
}

fn address_matches(candidate: &str, position: &Position) -> bool {
    let candidate = candidate.trim();
    if candidate.eq_ignore_ascii_case(position.address.trim()) {
        return true;
    }
    // A bare tile name covers every clearing on the tile.
    tile_of(candidate) == candidate && candidate.eq_ignore_ascii_case(position.tile())
}
