//! Dependency layering for step diagrams.
//!
//! [`layer_steps`] assigns every step a rank: origins (no required or
//! fail-trigger edges) sit at rank 0, and a step is placed under each node of
//! the previous rank that it depends on. A step whose dependencies are not
//! all placed yet appears as a *virtual* placeholder and is placed for real
//! at a later rank. Steps caught in a dependency cycle never leave virtual
//! status.
//!
//! The result depends only on input order, so diagrams are reproducible.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::EntityId;

/// One step and the steps it waits on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerInput {
    pub step: EntityId,
    pub depends_on: SmallVec<[EntityId; 4]>,
}

impl LayerInput {
    pub fn new(step: EntityId, depends_on: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            step,
            depends_on: depends_on.into_iter().collect(),
        }
    }
}

/// A placement in the diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerNode {
    pub step: EntityId,
    /// The node in the previous rank this one hangs under. `None` for origins.
    pub parent: Option<EntityId>,
    pub is_virtual: bool,
}

/// Ranked placements, rank 0 first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLayout {
    ranks: Vec<Vec<LayerNode>>,
}

impl StepLayout {
    #[must_use]
    pub fn ranks(&self) -> &[Vec<LayerNode>] {
        &self.ranks
    }

    #[must_use]
    pub fn rank_count(&self) -> usize {
        self.ranks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Rank where `step` is placed for real.
    #[must_use]
    pub fn concrete_rank(&self, step: EntityId) -> Option<usize> {
        self.ranks
            .iter()
            .position(|rank| rank.iter().any(|n| n.step == step && !n.is_virtual))
    }

    /// Ranks where `step` appears as a placeholder.
    #[must_use]
    pub fn virtual_ranks(&self, step: EntityId) -> Vec<usize> {
        self.ranks
            .iter()
            .enumerate()
            .filter(|(_, rank)| rank.iter().any(|n| n.step == step && n.is_virtual))
            .map(|(index, _)| index)
            .collect()
    }

    #[must_use]
    pub fn virtual_count(&self) -> usize {
        self.ranks.iter().flatten().filter(|n| n.is_virtual).count()
    }
}

/// Rank `inputs` for display.
#[must_use]
pub fn layer_steps(inputs: &[LayerInput]) -> StepLayout {
    let origins: Vec<LayerNode> = inputs
        .iter()
        .filter(|input| input.depends_on.is_empty())
        .map(|input| LayerNode {
            step: input.step,
            parent: None,
            is_virtual: false,
        })
        .collect();
    if origins.is_empty() {
        return StepLayout::default();
    }

    let mut placed: FxHashSet<EntityId> = origins.iter().map(|n| n.step).collect();
    let mut pool: Vec<&LayerInput> = inputs
        .iter()
        .filter(|input| !input.depends_on.is_empty())
        .collect();
    let mut ranks = vec![origins];

    loop {
        // Placements within a rank do not satisfy each other.
        let concrete = placed.clone();
        let mut next = Vec::new();

        if let Some(previous) = ranks.last() {
            for parent in previous {
                let mut index = 0;
                while index < pool.len() {
                    let candidate = pool[index];
                    if candidate.step != parent.step && !candidate.depends_on.contains(&parent.step) {
                        index += 1;
                        continue;
                    }
                    let is_virtual = !candidate.depends_on.iter().all(|dep| concrete.contains(dep));
                    next.push(LayerNode {
                        step: candidate.step,
                        parent: Some(parent.step),
                        is_virtual,
                    });
                    if is_virtual {
                        index += 1;
                    } else {
                        placed.insert(candidate.step);
                        pool.remove(index);
                    }
                }
            }
        }

        if next.is_empty() {
            break;
        }
        let all_virtual = next.iter().all(|n| n.is_virtual);
        ranks.push(next);
        if all_virtual {
            break;
        }
    }

    StepLayout { ranks }
}
