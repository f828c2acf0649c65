//! Rewards: what a step hands out when it finishes.
//!
//! Rewards belong to a [`RewardGroup`]. The reserved `ALL` group is always
//! paid out; the remaining groups are alternatives and the player picks one
//! (see `QuestStep::select_rewards`).

mod resolver;

pub use resolver::{RewardContext, RewardOutcome, RewardResolver};

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, IdMap};
use crate::error::Result;

/// Name of the group that is always applied.
pub const ALL_GROUP: &str = "ALL";

/// Reward group name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardGroup(pub String);

impl RewardGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn all() -> Self {
        Self(ALL_GROUP.to_string())
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        self.0.eq_ignore_ascii_case(ALL_GROUP)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for RewardGroup {
    fn default() -> Self {
        Self::all()
    }
}

/// What a reward does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RewardKind {
    /// Add `delta` to a character state value.
    Attribute { key: String, delta: i64 },

    /// Write (or overwrite) a quest journal entry.
    Journal { key: String, text: String },

    /// Pick up (`gain`) or hand off a minor character.
    MinorCharacter { minor: EntityId, gain: bool },

    QuestComplete,

    QuestFailed,

    /// Let the player pick which dependent step comes next. The others fail.
    ChooseNextStep,

    /// Applied by the host.
    Custom { key: String },
}

impl RewardKind {
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Attribute { key, delta } if *delta >= 0 => format!("Gain {delta} {key}"),
            Self::Attribute { key, delta } => format!("Lose {} {key}", -delta),
            Self::Journal { text, .. } => text.clone(),
            Self::MinorCharacter { minor, gain: true } => format!("Gain {minor}"),
            Self::MinorCharacter { minor, gain: false } => format!("Lose {minor}"),
            Self::QuestComplete => "Quest complete".to_string(),
            Self::QuestFailed => "Quest failed".to_string(),
            Self::ChooseNextStep => "Choose the next step".to_string(),
            Self::Custom { key } => key.clone(),
        }
    }
}

/// A reward attached to a quest step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    #[serde(default)]
    pub group: RewardGroup,
    pub kind: RewardKind,
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque icon reference shown when the group is offered.
    #[serde(default)]
    pub icon: Option<String>,
}

impl Reward {
    pub fn new(kind: RewardKind) -> Self {
        Self {
            group: RewardGroup::all(),
            kind,
            description: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = RewardGroup::new(group);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Explicit description, or one derived from the kind.
    #[must_use]
    pub fn describe(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| self.kind.description())
    }

    #[must_use]
    pub fn uses_minor_character(&self, id: EntityId) -> bool {
        matches!(self.kind, RewardKind::MinorCharacter { minor, .. } if minor == id)
    }

    /// Rewrite entity references after a copy.
    pub fn update_ids(&mut self, map: &IdMap) -> Result<()> {
        if let RewardKind::MinorCharacter { minor, .. } = &mut self.kind {
            *minor = map.resolve(*minor)?;
        }
        Ok(())
    }
}
