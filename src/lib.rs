//! # quest-engine
//!
//! The quest rules layer of a multiplayer board-game simulator.
//!
//! A quest is a directed graph of steps. Each game event runs an evaluation
//! pass: Ready steps check their requirements, finished steps pay out
//! rewards and unlock their dependents, and the pass repeats until nothing
//! more happens. Quests are dealt from shuffled decks of templates, and
//! all-play quests give every player their own copy of a shared objective.
//!
//! ## Design Principles
//!
//! 1. **Ids, not pointers**: steps, locations and minor characters refer to
//!    each other by `EntityId`, so any quest can be deep-copied and remapped.
//!
//! 2. **Deterministic**: all randomness flows through a seeded `GameRng`;
//!    a fixed seed replays shuffles and random locations identically.
//!
//! 3. **Host at the edges**: characters, player choices and custom rule
//!    kinds are traits and callbacks the host supplies.
//!
//! ## Modules
//!
//! - `core`: Entity IDs, calendar, characters, RNG, configuration
//! - `interaction`: Player choice boundary
//! - `requirements`: Step conditions and their evaluator
//! - `rewards`: Step rewards and their resolver
//! - `quests`: Quests, steps, locations, journal
//! - `deck`: Quest decks and all-play dealing
//! - `layering`: Rank assignment for step diagrams
//! - `book`: Per-session quest store
//! - `loader`: Quest definition files

pub mod core;
pub mod error;
pub mod interaction;
pub mod hooks;
pub mod requirements;
pub mod rewards;
pub mod quests;
pub mod deck;
pub mod layering;
pub mod book;
pub mod loader;

// Re-export commonly used types
pub use crate::core::{
    EntityId, IdAllocator, IdMap,
    DayKey,
    GameRng, GameRngState,
    CharacterId, CharacterRecord, Gender, Position, QuestCharacter,
    EngineConfig, GameSettings, GameVariant, HostRules,
};

pub use crate::error::{QuestError, Result};

pub use crate::interaction::{ChoiceOption, FirstChoice, Interaction, NoChoice, ScriptedChoices};

pub use crate::hooks::QuestHooks;

pub use crate::requirements::{
    Requirement, RequirementContext, RequirementEvaluator, RequirementParams,
};

pub use crate::rewards::{Reward, RewardContext, RewardGroup, RewardKind, RewardResolver};

pub use crate::quests::{
    Quest, QuestStep, QuestState, StepState, LogicType,
    QuestLocation, LocationType, MinorCharacter, QuestEligibility,
    Journal, AttributeKey, AttributeValue, Attributes,
};

pub use crate::deck::QuestDeck;

pub use crate::layering::{layer_steps, LayerInput, LayerNode, StepLayout};

pub use crate::book::QuestBook;

pub use crate::loader::QuestLoader;
