//! Session randomness.
//!
//! Every random decision the quest engine makes (deck order, random quest
//! locations) draws from one `GameRng` owned by the session. Replaying a game
//! from the same seed deals the same quests and picks the same places.
//!
//! ```
//! use quest_engine::core::GameRng;
//!
//! let mut deck = vec![1, 2, 3, 4, 5];
//! GameRng::new(42).shuffle(&mut deck);
//!
//! let mut replay = vec![1, 2, 3, 4, 5];
//! GameRng::new(42).shuffle(&mut replay);
//! assert_eq!(deck, replay);
//! ```

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Faces on the game's die.
pub const DIE_FACES: u8 = 6;

/// Seeded ChaCha8 generator.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform permutation in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    /// Uniform pick. `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }

    /// One die roll, 1 to [`DIE_FACES`].
    pub fn roll_die(&mut self) -> u8 {
        self.inner.gen_range(1..=DIE_FACES)
    }

    /// Position in the stream, for saving a session mid-game.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Resume a saved stream exactly where it stopped.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Saved position of a [`GameRng`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    pub seed: u64,
    /// ChaCha8 word counter.
    pub word_pos: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rolls(rng: &mut GameRng, n: usize) -> Vec<u8> {
        (0..n).map(|_| rng.roll_die()).collect()
    }

    #[test]
    fn test_same_seed_same_rolls() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(42);
        assert_eq!(rolls(&mut a, 50), rolls(&mut b, 50));
    }

    #[test]
    fn test_rolls_stay_on_the_die() {
        let mut rng = GameRng::new(3);
        assert!(rolls(&mut rng, 200).iter().all(|r| (1..=DIE_FACES).contains(r)));
    }

    #[test]
    fn test_choose_from_empty() {
        let mut rng = GameRng::new(42);
        let none: [&str; 0] = [];
        assert!(rng.choose(&none).is_none());

        let places = ["Cavern 4", "Ledges 2"];
        assert!(places.contains(rng.choose(&places).unwrap()));
    }

    #[test]
    fn test_resume_from_saved_state() {
        let mut rng = GameRng::new(9);
        rolls(&mut rng, 17);

        let saved = rng.state();
        let expected = rolls(&mut rng, 10);

        let mut resumed = GameRng::from_state(&saved);
        assert_eq!(resumed.seed(), 9);
        assert_eq!(rolls(&mut resumed, 10), expected);
    }

    #[test]
    fn test_state_serde() {
        let state = GameRngState { seed: 42, word_pos: 12345 };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<GameRngState>(&json).unwrap(), state);
    }
}
