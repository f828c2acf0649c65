//! Quest decks.
//!
//! A `QuestDeck` holds references to quest templates stored in a
//! [`QuestBook`]. Drawing a template hands out a fresh copy, so templates
//! themselves are never played. All-play templates are kept on a separate
//! list and every character receives their own copy of each.
//!
//! The deck is face down and pre-shuffled: drawing always takes the card at
//! position 0. When the last card is drawn the discard pile is shuffled back
//! in. An empty deck with an empty discard pile just yields no card.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::book::QuestBook;
use crate::core::{EntityId, GameRng, QuestCharacter};
use crate::error::{QuestError, Result};
use crate::hooks::QuestHooks;
use crate::quests::QuestState;

/// How many times `shuffle` permutes the deck.
const SHUFFLE_PASSES: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestDeck {
    cards: Vec<EntityId>,
    discard: Vec<EntityId>,
    all_play: Vec<EntityId>,
    next_unique_id: u32,
}

impl Default for QuestDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestDeck {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            discard: Vec::new(),
            all_play: Vec::new(),
            next_unique_id: 1,
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[EntityId] {
        &self.cards
    }

    #[must_use]
    pub fn discards(&self) -> &[EntityId] {
        &self.discard
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Templates every character receives a copy of.
    #[must_use]
    pub fn all_play_cards(&self) -> &[EntityId] {
        &self.all_play
    }

    /// Turn a stored quest into a template and add `count` references to it.
    ///
    /// The template gets a fresh unique id. A `count` of zero adds nothing
    /// and leaves the quest untouched. All-play templates go on the all-play
    /// list once, since each character is dealt exactly one copy; a larger
    /// `count` is logged and otherwise ignored.
    pub fn add_cards(&mut self, book: &mut QuestBook, template: EntityId, count: usize) -> Result<()> {
        let quest = book
            .quest_mut(template)
            .ok_or(QuestError::UnknownQuest(template))?;
        if count == 0 {
            return Ok(());
        }
        quest.is_template = true;
        quest.unique_id = Some(self.next_unique_id);
        self.next_unique_id += 1;

        if quest.all_play {
            if count > 1 {
                warn!(
                    "All-play quest '{}' is dealt once per character: ignoring count {}",
                    quest.title, count
                );
            }
            if !self.all_play.contains(&template) {
                self.all_play.push(template);
            }
        } else {
            self.cards.extend(std::iter::repeat(template).take(count));
        }
        Ok(())
    }

    pub fn shuffle(&mut self, rng: &mut GameRng) {
        for _ in 0..SHUFFLE_PASSES {
            rng.shuffle(&mut self.cards);
        }
    }

    fn refill(&mut self, rng: &mut GameRng) {
        if self.discard.is_empty() {
            return;
        }
        info!("Quest deck empty: reshuffling {} discards", self.discard.len());
        self.cards.append(&mut self.discard);
        self.shuffle(rng);
    }

    /// Draw the top card. Templates are copied into the book and the copy's
    /// id is returned. `None` when deck and discard pile are both empty.
    pub fn draw_card(&mut self, book: &mut QuestBook) -> Result<Option<EntityId>> {
        if self.cards.is_empty() {
            self.refill(&mut book.rng);
        }
        if self.cards.is_empty() {
            return Ok(None);
        }
        let card = self.cards.remove(0);
        if self.cards.is_empty() {
            self.refill(&mut book.rng);
        }

        let is_template = book
            .quest(card)
            .ok_or(QuestError::UnknownQuest(card))?
            .is_template;
        if is_template {
            book.copy_quest(card).map(Some)
        } else {
            Ok(Some(card))
        }
    }

    /// Reset a quest and put it on the discard pile.
    pub fn discard_card(&mut self, book: &mut QuestBook, quest: EntityId) -> Result<()> {
        book.quest_mut(quest)
            .ok_or(QuestError::UnknownQuest(quest))?
            .reset();
        self.discard.push(quest);
        Ok(())
    }

    /// Give `character` a copy of every all-play template still in play.
    /// Returns the copies' ids.
    pub fn setup_all_play_cards(
        &self,
        book: &mut QuestBook,
        character: &dyn QuestCharacter,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<Vec<EntityId>> {
        let mut dealt = Vec::new();
        for &template in &self.all_play {
            let state = book
                .quest(template)
                .ok_or(QuestError::UnknownQuest(template))?
                .state;
            if state != QuestState::New {
                continue;
            }
            dealt.push(book.choose_quest(template, character, hooks)?);
        }
        Ok(dealt)
    }

    /// Fill `character`'s open quest slots. Stops early if the deck runs dry.
    /// Returns the ids drawn.
    pub fn draw_cards(
        &mut self,
        book: &mut QuestBook,
        character: &dyn QuestCharacter,
        hooks: &mut QuestHooks<'_>,
    ) -> Result<Vec<EntityId>> {
        let open = character
            .quest_slots()
            .saturating_sub(book.unfinished_count(character.character_id()));
        let mut drawn = Vec::with_capacity(open);
        for _ in 0..open {
            let Some(quest) = self.draw_card(book)? else {
                break;
            };
            book.assign_quest(quest, character, hooks)?;
            drawn.push(quest);
        }
        Ok(drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CharacterId, CharacterRecord, DayKey, Gender};
    use crate::interaction::NoChoice;
    use crate::quests::{Quest, QuestStep};

    fn template(book: &mut QuestBook, title: &str) -> EntityId {
        let id = book.next_id();
        let step = book.next_id();
        book.add_quest(Quest::new(id, title).with_step(QuestStep::new(step, "Go")))
    }

    #[test]
    fn test_add_cards_marks_template() {
        let mut book = QuestBook::new(1);
        let mut deck = QuestDeck::new();
        let a = template(&mut book, "A");
        let b = template(&mut book, "B");
        deck.add_cards(&mut book, a, 2).unwrap();
        deck.add_cards(&mut book, b, 1).unwrap();

        assert_eq!(deck.cards(), &[a, a, b]);
        assert!(book.quest(a).unwrap().is_template);
        assert_eq!(book.quest(a).unwrap().unique_id, Some(1));
        assert_eq!(book.quest(b).unwrap().unique_id, Some(2));
    }

    #[test]
    fn test_all_play_kept_apart() {
        let mut book = QuestBook::new(1);
        let mut deck = QuestDeck::new();
        let a = template(&mut book, "Everyone");
        book.quest_mut(a).unwrap().all_play = true;
        deck.add_cards(&mut book, a, 3).unwrap();
        deck.add_cards(&mut book, a, 3).unwrap();

        assert!(deck.is_empty());
        assert_eq!(deck.all_play_cards(), &[a]);
    }

    #[test]
    fn test_zero_count_adds_nothing() {
        let mut book = QuestBook::new(1);
        let mut deck = QuestDeck::new();
        let a = template(&mut book, "A");
        let shared = template(&mut book, "Everyone");
        book.quest_mut(shared).unwrap().all_play = true;
        deck.add_cards(&mut book, a, 0).unwrap();
        deck.add_cards(&mut book, shared, 0).unwrap();

        assert!(deck.is_empty());
        assert!(deck.all_play_cards().is_empty());
        assert!(!book.quest(a).unwrap().is_template);
        assert_eq!(book.quest(shared).unwrap().unique_id, None);

        // The skipped calls did not use up unique ids.
        deck.add_cards(&mut book, shared, 2).unwrap();
        assert_eq!(deck.all_play_cards(), &[shared]);
        assert_eq!(book.quest(shared).unwrap().unique_id, Some(1));
    }

    #[test]
    fn test_draw_copies_template() {
        let mut book = QuestBook::new(1);
        let mut deck = QuestDeck::new();
        let a = template(&mut book, "A");
        deck.add_cards(&mut book, a, 1).unwrap();

        let drawn = deck.draw_card(&mut book).unwrap().unwrap();
        assert_ne!(drawn, a);
        let copy = book.quest(drawn).unwrap();
        assert!(!copy.is_template);
        assert_eq!(copy.unique_id, Some(1));
        assert_eq!(deck.draw_card(&mut book).unwrap(), None);
    }

    #[test]
    fn test_discard_and_reshuffle() {
        let mut book = QuestBook::new(1);
        let mut deck = QuestDeck::new();
        let a = template(&mut book, "A");
        let b = template(&mut book, "B");
        deck.add_cards(&mut book, a, 1).unwrap();
        deck.add_cards(&mut book, b, 1).unwrap();

        let first = deck.draw_card(&mut book).unwrap().unwrap();
        deck.discard_card(&mut book, first).unwrap();
        assert_eq!(deck.discards(), &[first]);

        // Drawing the last card pulls the discard pile back in.
        let second = deck.draw_card(&mut book).unwrap().unwrap();
        assert_ne!(second, first);
        assert_eq!(deck.cards(), &[first]);
        assert!(deck.discards().is_empty());

        // Discarded instances are reused as they are.
        assert_eq!(deck.draw_card(&mut book).unwrap(), Some(first));
        assert_eq!(deck.draw_card(&mut book).unwrap(), None);
    }

    #[test]
    fn test_draw_cards_fills_slots() {
        let mut book = QuestBook::new(1);
        let mut deck = QuestDeck::new();
        let a = template(&mut book, "A");
        deck.add_cards(&mut book, a, 5).unwrap();
        let character = CharacterRecord::new(CharacterId::new(1), "Druid", Gender::Female)
            .with_quest_slots(3)
            .on_day(DayKey::first());

        let mut chooser = NoChoice;
        let mut hooks = QuestHooks::new(&mut chooser);
        let drawn = deck.draw_cards(&mut book, &character, &mut hooks).unwrap();
        assert_eq!(drawn.len(), 3);
        assert_eq!(deck.len(), 2);
        assert!(deck.draw_cards(&mut book, &character, &mut hooks).unwrap().is_empty());

        for id in drawn {
            assert_eq!(book.quest(id).unwrap().state, QuestState::Assigned);
        }
    }
}
