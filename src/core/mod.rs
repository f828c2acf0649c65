//! Core engine types: ids, calendar, characters, RNG, configuration.
//!
//! This module contains the building blocks shared by every quest subsystem.
//! None of it knows about steps or decks.

pub mod entity;
pub mod day;
pub mod character;
pub mod rng;
pub mod config;

pub use entity::{EntityId, IdAllocator, IdMap};
pub use day::{DayKey, DAYS_PER_MONTH};
pub use character::{
    tile_of, CharacterId, CharacterRecord, ClearingKind, Gender, Position, QuestCharacter,
    TileSide,
};
pub use rng::{GameRng, GameRngState, DIE_FACES};
pub use config::{
    EngineConfig, GameSettings, GameVariant, HostRules, DEFAULT_QUEST_FOLDER,
    QUEST_FILE_EXTENSION, QUEST_FOLDER_ENV,
};
