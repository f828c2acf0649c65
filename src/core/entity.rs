//! Entity identification and id remapping.
//!
//! Every object the quest engine tracks (quests, steps, locations, minor
//! characters) has a unique `EntityId`. Ids are handed out by an
//! `IdAllocator` owned by the session.
//!
//! ## Remapping
//!
//! Step edges and requirement/reward references are stored as ids, never as
//! direct links. Copying a quest allocates fresh ids for everything it
//! contains and records the old → new pairs in an `IdMap`; every stored
//! reference is then rewritten through the map.
//!
//! ```
//! use quest_engine::core::{EntityId, IdAllocator, IdMap};
//!
//! let mut ids = IdAllocator::new();
//! let old = ids.next_id();
//! let new = ids.next_id();
//!
//! let mut map = IdMap::new();
//! map.insert(old, new);
//! assert_eq!(map.resolve(old).unwrap(), new);
//! assert!(map.resolve(EntityId(99)).is_err());
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{QuestError, Result};

/// Unique identifier for any quest-engine entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Monotonic id source for one session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Create an allocator starting at id 1.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Create an allocator whose first id is `first`.
    #[must_use]
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Allocate a new entity ID.
    pub fn next_id(&mut self) -> EntityId {
        // Default-constructed allocators start at 0; keep 0 unused.
        if self.next == 0 {
            self.next = 1;
        }
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Peek at the id the next call to `next_id` returns.
    #[must_use]
    pub fn peek(&self) -> EntityId {
        EntityId(self.next.max(1))
    }
}

/// Old → new id table built while copying a quest.
#[derive(Clone, Debug, Default)]
pub struct IdMap {
    entries: FxHashMap<EntityId, EntityId>,
}

impl IdMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `old` is now known as `new`.
    pub fn insert(&mut self, old: EntityId, new: EntityId) {
        self.entries.insert(old, new);
    }

    /// Translate an old id.
    ///
    /// A missing entry means the source object referenced something it does
    /// not own, which is a corruption error.
    pub fn resolve(&self, old: EntityId) -> Result<EntityId> {
        self.entries
            .get(&old)
            .copied()
            .ok_or(QuestError::UnmappedReference { id: old })
    }

    /// Translate every id of an edge list in place.
    pub fn remap_all<'a>(&self, ids: impl IntoIterator<Item = &'a mut EntityId>) -> Result<()> {
        for id in ids {
            *id = self.resolve(*id)?;
        }
        Ok(())
    }

    /// Number of recorded pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no pairs are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a, EntityId(1));
        assert_eq!(b, EntityId(2));
        assert_eq!(ids.peek(), EntityId(3));
    }

    #[test]
    fn test_default_allocator_skips_zero() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.next_id(), EntityId(1));
    }

    #[test]
    fn test_starting_at() {
        let mut ids = IdAllocator::starting_at(100);
        assert_eq!(ids.next_id(), EntityId(100));
    }

    #[test]
    fn test_id_map_resolve() {
        let mut map = IdMap::new();
        map.insert(EntityId(1), EntityId(10));

        assert_eq!(map.resolve(EntityId(1)).unwrap(), EntityId(10));
        assert!(matches!(
            map.resolve(EntityId(2)),
            Err(QuestError::UnmappedReference { id: EntityId(2) })
        ));
    }

    #[test]
    fn test_remap_all() {
        let mut map = IdMap::new();
        map.insert(EntityId(1), EntityId(10));
        map.insert(EntityId(2), EntityId(20));

        let mut edges = vec![EntityId(2), EntityId(1)];
        map.remap_all(edges.iter_mut()).unwrap();
        assert_eq!(edges, vec![EntityId(20), EntityId(10)]);

        let mut dangling = vec![EntityId(3)];
        assert!(map.remap_all(dangling.iter_mut()).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", EntityId(42)), "Entity(42)");
    }

    #[test]
    fn test_serialization() {
        let id = EntityId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
