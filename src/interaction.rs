//! The interaction boundary.
//!
//! Whenever the rules need a player decision (which reward group to take,
//! which candidate location a quest should use) the engine calls
//! [`Interaction::choose_one`] synchronously and continues with the answer.
//! `None` means "no selection" and the engine applies nothing.

use std::collections::VecDeque;

/// One selectable option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceOption {
    pub description: String,
    /// Opaque icon reference for the presentation layer.
    pub icon: Option<String>,
}

impl ChoiceOption {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            icon: None,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Something that can ask a player to pick one option.
pub trait Interaction {
    /// Returns the index of the selected option, or `None`.
    fn choose_one(&mut self, prompt: &str, options: &[ChoiceOption]) -> Option<usize>;
}

/// Always picks the first option. Useful for bots and headless hosts.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstChoice;

impl Interaction for FirstChoice {
    fn choose_one(&mut self, _prompt: &str, options: &[ChoiceOption]) -> Option<usize> {
        if options.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// Never selects anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoChoice;

impl Interaction for NoChoice {
    fn choose_one(&mut self, _prompt: &str, _options: &[ChoiceOption]) -> Option<usize> {
        None
    }
}

/// Replays a fixed list of answers and records every prompt it was shown.
#[derive(Clone, Debug, Default)]
pub struct ScriptedChoices {
    answers: VecDeque<Option<usize>>,
    /// Prompts seen so far, with the options offered.
    pub asked: Vec<(String, Vec<ChoiceOption>)>,
}

impl ScriptedChoices {
    pub fn new(answers: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

impl Interaction for ScriptedChoices {
    fn choose_one(&mut self, prompt: &str, options: &[ChoiceOption]) -> Option<usize> {
        self.asked.push((prompt.to_string(), options.to_vec()));
        self.answers
            .pop_front()
            .flatten()
            .filter(|&index| index < options.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_choice() {
        let mut chooser = FirstChoice;
        assert_eq!(chooser.choose_one("pick", &[]), None);
        assert_eq!(
            chooser.choose_one("pick", &[ChoiceOption::new("a"), ChoiceOption::new("b")]),
            Some(0)
        );
    }

    #[test]
    fn test_no_choice() {
        let mut chooser = NoChoice;
        assert_eq!(chooser.choose_one("pick", &[ChoiceOption::new("a")]), None);
    }

    #[test]
    fn test_scripted_choices() {
        let mut chooser = ScriptedChoices::new([Some(1), None, Some(5)]);
        let options = [ChoiceOption::new("a"), ChoiceOption::new("b").with_icon("gold")];

        assert_eq!(chooser.choose_one("first", &options), Some(1));
        assert_eq!(chooser.choose_one("second", &options), None);
        // Out of range answers count as no selection.
        assert_eq!(chooser.choose_one("third", &options), None);
        // Exhausted script.
        assert_eq!(chooser.choose_one("fourth", &options), None);

        assert_eq!(chooser.asked.len(), 4);
        assert_eq!(chooser.asked[0].0, "first");
        assert_eq!(chooser.asked[0].1[1].icon.as_deref(), Some("gold"));
    }
}
