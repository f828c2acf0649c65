//! Error type shared by the whole crate.
//!
//! Only corruption and programmer errors are reported as `Err`. Conditions a
//! player can run into during normal play (a dry deck, a declined choice, a
//! quest that is not being tracked yet) are answered with `None`/`false`.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::EntityId;

/// Errors raised by the quest engine.
#[derive(Debug, Error)]
pub enum QuestError {
    #[error("reference to {id} has no entry in the id remap table")]
    UnmappedReference { id: EntityId },

    #[error("no quest with id {0}")]
    UnknownQuest(EntityId),

    #[error("no step with id {0}")]
    UnknownStep(EntityId),

    #[error("no quest location with id {0}")]
    UnknownLocation(EntityId),

    #[error("no minor character with id {0}")]
    UnknownMinorCharacter(EntityId),

    #[error("{0} is still referenced by a requirement or reward")]
    InUse(EntityId),

    #[error("quest '{title}' is already being evaluated")]
    ReentrantEvaluation { title: String },

    #[error("quest '{title}' cannot go from {from} to {to}")]
    InvalidTransition {
        title: String,
        from: String,
        to: String,
    },

    #[error("invalid day key '{0}'")]
    InvalidDayKey(String),

    #[error("invalid character pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, QuestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = QuestError::UnmappedReference { id: EntityId(7) };
        assert_eq!(
            err.to_string(),
            "reference to Entity(7) has no entry in the id remap table"
        );

        let err = QuestError::ReentrantEvaluation {
            title: "Find the Lost City".to_string(),
        };
        assert!(err.to_string().contains("Find the Lost City"));
    }

    #[test]
    fn test_pattern_conversion() {
        let bad = regex::Regex::new("(").unwrap_err();
        let err: QuestError = bad.into();
        assert!(matches!(err, QuestError::InvalidPattern(_)));
    }
}
