//! The character boundary.
//!
//! Characters belong to the host's rule systems. The quest engine only needs
//! the small surface described by [`QuestCharacter`]: identity, calendar,
//! position, a few state values, and the names of things the character holds.
//!
//! [`CharacterRecord`] is a plain in-memory implementation used by hosts that
//! have no richer model, and by the tests.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::day::DayKey;

/// Identifier for a character in a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub u32);

impl CharacterId {
    /// Create a new character ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Character({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// Kind of clearing on a map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearingKind {
    Woods,
    Cave,
    Mountain,
}

/// Which face of a map tile is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileSide {
    #[default]
    Normal,
    Enchanted,
}

/// Where a character currently stands.
///
/// `address` is the host's textual address, `"<tile> <clearing>"`
/// (e.g. `"Cavern 4"`); a bare tile name addresses the whole tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub address: String,
    pub clearing: Option<ClearingKind>,
    pub side: TileSide,
}

impl Position {
    /// Create a position on the normal side with no clearing kind.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            clearing: None,
            side: TileSide::Normal,
        }
    }

    #[must_use]
    pub fn with_clearing(mut self, clearing: ClearingKind) -> Self {
        self.clearing = Some(clearing);
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: TileSide) -> Self {
        self.side = side;
        self
    }

    /// The tile part of the address.
    #[must_use]
    pub fn tile(&self) -> &str {
        tile_of(&self.address)
    }
}

/// Strip a trailing clearing number from an address.
#[must_use]
pub fn tile_of(address: &str) -> &str {
    let trimmed = address.trim();
    match trimmed.rsplit_once(' ') {
        Some((tile, clearing)) if clearing.chars().all(|c| c.is_ascii_digit()) => tile.trim(),
        _ => trimmed,
    }
}

/// What the quest engine needs from a character.
pub trait QuestCharacter {
    fn character_id(&self) -> CharacterId;

    fn name(&self) -> &str;

    fn gender(&self) -> Gender;

    /// Today, from this character's point of view.
    fn current_day(&self) -> DayKey;

    /// How many quests the character may hold at once.
    fn quest_slots(&self) -> usize;

    fn current_position(&self) -> Option<&Position>;

    /// Get a state value (gold, fame, notoriety, ...) with default.
    fn get_state(&self, key: &str, default: i64) -> i64;

    /// Modify a state value by delta.
    fn modify_state(&mut self, key: &str, delta: i64);

    /// Does the character carry/escort the named thing?
    fn holds(&self, name: &str) -> bool;

    fn hold(&mut self, name: &str);

    fn release(&mut self, name: &str);
}

/// In-memory character.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: CharacterId,
    pub name: String,
    pub gender: Gender,
    pub day: DayKey,
    pub quest_slots: usize,
    pub position: Option<Position>,
    #[serde(default)]
    pub state: FxHashMap<String, i64>,
    #[serde(default)]
    pub held: FxHashSet<String>,
}

impl CharacterRecord {
    /// Create a character with two quest slots on day 1:1.
    pub fn new(id: CharacterId, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id,
            name: name.into(),
            gender,
            day: DayKey::first(),
            quest_slots: 2,
            position: None,
            state: FxHashMap::default(),
            held: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn with_quest_slots(mut self, slots: usize) -> Self {
        self.quest_slots = slots;
        self
    }

    #[must_use]
    pub fn on_day(mut self, day: DayKey) -> Self {
        self.day = day;
        self
    }

    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Move the character.
    pub fn move_to(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Advance the calendar by one day.
    pub fn end_day(&mut self) {
        self.day = self.day.next_day();
    }
}

impl QuestCharacter for CharacterRecord {
    fn character_id(&self) -> CharacterId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn gender(&self) -> Gender {
        self.gender
    }

    fn current_day(&self) -> DayKey {
        self.day
    }

    fn quest_slots(&self) -> usize {
        self.quest_slots
    }

    fn current_position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    fn get_state(&self, key: &str, default: i64) -> i64 {
        self.state.get(key).copied().unwrap_or(default)
    }

    fn modify_state(&mut self, key: &str, delta: i64) {
        *self.state.entry(key.to_string()).or_insert(0) += delta;
    }

    fn holds(&self, name: &str) -> bool {
        self.held.contains(name)
    }

    fn hold(&mut self, name: &str) {
        self.held.insert(name.to_string());
    }

    fn release(&mut self, name: &str) {
        self.held.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_of() {
        assert_eq!(tile_of("Cavern 4"), "Cavern");
        assert_eq!(tile_of("Evil Valley 5"), "Evil Valley");
        assert_eq!(tile_of("Ledges"), "Ledges");
        assert_eq!(tile_of("Dark Valley"), "Dark Valley");
    }

    #[test]
    fn test_character_state() {
        let mut hero = CharacterRecord::new(CharacterId::new(1), "Amazon", Gender::Female);

        assert_eq!(hero.get_state("gold", 10), 10);
        hero.modify_state("gold", 5);
        hero.modify_state("gold", -2);
        assert_eq!(hero.get_state("gold", 0), 3);
    }

    #[test]
    fn test_character_holdings() {
        let mut hero = CharacterRecord::new(CharacterId::new(1), "Amazon", Gender::Female);

        assert!(!hero.holds("Squire"));
        hero.hold("Squire");
        assert!(hero.holds("Squire"));
        hero.release("Squire");
        assert!(!hero.holds("Squire"));
    }

    #[test]
    fn test_end_day() {
        let mut hero = CharacterRecord::new(CharacterId::new(1), "Amazon", Gender::Female)
            .on_day(DayKey::new(1, 28));
        hero.end_day();
        assert_eq!(hero.current_day(), DayKey::new(2, 1));
    }
}
