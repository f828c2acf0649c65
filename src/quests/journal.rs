//! Quest journal.
//!
//! An ordered list of entries keyed by string. Writing an existing key
//! replaces that entry where it stands, so a step can keep one evolving note.

use serde::{Deserialize, Serialize};

use crate::core::DayKey;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub key: String,
    pub day: DayKey,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, overwriting in place if `key` already exists.
    pub fn write(&mut self, key: impl Into<String>, day: DayKey, text: impl Into<String>) {
        let key = key.into();
        let text = text.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.day = day;
                entry.text = text;
            }
            None => self.entries.push(JournalEntry { key, day, text }),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_overwrites_in_place() {
        let mut journal = Journal::new();
        journal.write("a", DayKey::new(1, 1), "first");
        journal.write("b", DayKey::new(1, 2), "second");
        journal.write("a", DayKey::new(1, 3), "updated");

        let keys: Vec<_> = journal.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(journal.get("a").unwrap().text, "updated");
        assert_eq!(journal.get("a").unwrap().day, DayKey::new(1, 3));
    }

    #[test]
    fn test_clear() {
        let mut journal = Journal::new();
        journal.write("a", DayKey::first(), "x");
        journal.clear();
        assert!(journal.is_empty());
    }
}
