//! Host callbacks threaded through quest evaluation.
//!
//! `QuestHooks` bundles the interaction boundary with optional evaluators for
//! `Custom` requirement and reward kinds, the same way the host supplies
//! custom condition evaluators elsewhere: a key string plus a closure.

use crate::core::QuestCharacter;
use crate::interaction::Interaction;
use crate::requirements::RequirementParams;

type CustomRequirementFn<'a> = dyn FnMut(&str, &dyn QuestCharacter, &RequirementParams) -> bool + 'a;
type CustomRewardFn<'a> = dyn FnMut(&str, &mut dyn QuestCharacter) + 'a;

/// Callbacks available while a quest is initialized or evaluated.
pub struct QuestHooks<'a> {
    /// Player decisions (reward groups, location choices).
    pub interaction: &'a mut dyn Interaction,
    /// Evaluates `Requirement::Custom`. Without one, custom requirements fail.
    pub eval_custom: Option<Box<CustomRequirementFn<'a>>>,
    /// Applies `RewardKind::Custom`. Without one, custom rewards do nothing.
    pub apply_custom: Option<Box<CustomRewardFn<'a>>>,
}

impl<'a> QuestHooks<'a> {
    pub fn new(interaction: &'a mut dyn Interaction) -> Self {
        Self {
            interaction,
            eval_custom: None,
            apply_custom: None,
        }
    }

    /// Add a custom requirement evaluator.
    pub fn with_custom_requirement(
        mut self,
        eval: impl FnMut(&str, &dyn QuestCharacter, &RequirementParams) -> bool + 'a,
    ) -> Self {
        self.eval_custom = Some(Box::new(eval));
        self
    }

    /// Add a custom reward handler.
    pub fn with_custom_reward(
        mut self,
        apply: impl FnMut(&str, &mut dyn QuestCharacter) + 'a,
    ) -> Self {
        self.apply_custom = Some(Box::new(apply));
        self
    }

    pub(crate) fn eval_custom(
        &mut self,
        key: &str,
        character: &dyn QuestCharacter,
        params: &RequirementParams,
    ) -> bool {
        match self.eval_custom.as_mut() {
            Some(eval) => eval(key, character, params),
            None => false,
        }
    }

    pub(crate) fn apply_custom(&mut self, key: &str, character: &mut dyn QuestCharacter) {
        if let Some(apply) = self.apply_custom.as_mut() {
            apply(key, character);
        }
    }
}
