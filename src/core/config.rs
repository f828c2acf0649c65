//! Engine configuration.
//!
//! Hosts configure the quest engine at startup by providing:
//! - `EngineConfig`: where quest definition files live
//! - `HostRules`: host options the engine consults while evaluating
//! - `GameSettings`: board and variant facts used for quest eligibility

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Environment variable overriding the quest folder.
pub const QUEST_FOLDER_ENV: &str = "QUEST_FOLDER";

/// Folder searched for quest files when nothing overrides it.
pub const DEFAULT_QUEST_FOLDER: &str = "./quests/";

/// Extension (without dot) of quest definition files.
pub const QUEST_FILE_EXTENSION: &str = "quest";

/// Host options consulted by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRules {
    /// When one player completes an all-play quest, every other live copy
    /// of it fails.
    pub all_play_single_completion: bool,

    /// Testing quests are offered in the available pool.
    pub include_testing_quests: bool,
}

impl HostRules {
    #[must_use]
    pub fn with_all_play_single_completion(mut self) -> Self {
        self.all_play_single_completion = true;
        self
    }

    #[must_use]
    pub fn with_testing_quests(mut self) -> Self {
        self.include_testing_quests = true;
        self
    }
}

/// Rule set the game is being played with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameVariant {
    #[default]
    Original,
    Pruitts,
    Expansion,
}

/// Facts about the running game that quests may be restricted to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Number of map boards in play.
    pub board_count: u8,
    pub variant: GameVariant,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            board_count: 1,
            variant: GameVariant::Original,
        }
    }
}

/// Quest engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Folder holding quest definition files.
    pub quest_folder: PathBuf,

    /// File extension of quest definition files, without the dot.
    pub extension: String,

    pub rules: HostRules,
    pub settings: GameSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quest_folder: PathBuf::from(DEFAULT_QUEST_FOLDER),
            extension: QUEST_FILE_EXTENSION.to_string(),
            rules: HostRules::default(),
            settings: GameSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Create a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with the quest folder taken from
    /// `QUEST_FOLDER` when it is set and non-empty.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(folder) = env::var(QUEST_FOLDER_ENV) {
            if !folder.trim().is_empty() {
                config.quest_folder = PathBuf::from(folder);
            }
        }
        config
    }

    #[must_use]
    pub fn with_quest_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.quest_folder = folder.into();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
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
}
