//! Who may take a quest.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::core::{GameSettings, GameVariant, Gender, QuestCharacter};
use crate::error::Result;

/// Restrictions checked before a quest is offered to a character.
///
/// Every field is optional; an empty filter accepts everyone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestEligibility {
    /// Case-insensitive pattern matched against the whole character name.
    #[serde(default)]
    pub character_pattern: Option<String>,

    #[serde(default)]
    pub gender: Option<Gender>,

    #[serde(default)]
    pub min_boards: Option<u8>,

    #[serde(default)]
    pub max_boards: Option<u8>,

    /// Variants the quest may be played in. Empty means any.
    #[serde(default)]
    pub variants: Vec<GameVariant>,
}

impl QuestEligibility {
    #[must_use]
    pub fn with_character_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.character_pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    #[must_use]
    pub fn with_boards(mut self, min: Option<u8>, max: Option<u8>) -> Self {
        self.min_boards = min;
        self.max_boards = max;
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: GameVariant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Name and gender checks. Fails only on a malformed pattern.
    pub fn character_matches(&self, character: &dyn QuestCharacter) -> Result<bool> {
        if self.gender.is_some_and(|gender| gender != character.gender()) {
            return Ok(false);
        }
        match &self.character_pattern {
            Some(pattern) => {
                let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
                    .case_insensitive(true)
                    .build()?;
                Ok(regex.is_match(character.name()))
            }
            None => Ok(true),
        }
    }

    #[must_use]
    pub fn settings_match(&self, settings: &GameSettings) -> bool {
        let boards = settings.board_count;
        self.min_boards.map_or(true, |min| boards >= min)
            && self.max_boards.map_or(true, |max| boards <= max)
            && (self.variants.is_empty() || self.variants.contains(&settings.variant))
    }
}
