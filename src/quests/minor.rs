//! Minor characters: quest-owned companions and NPCs.

use serde::{Deserialize, Serialize};

use super::attributes::{AttributeKey, AttributeValue, Attributes};
use crate::core::EntityId;

/// A character template owned by a quest (an escort, a captive, a guide).
///
/// Requirements and rewards reference minor characters by id; the name is
/// what the host shows and what a character "holds" while escorting one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorCharacter {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl MinorCharacter {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            attributes: Attributes::default(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<AttributeKey>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get_attr(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(&AttributeKey::new(key))
    }
}
