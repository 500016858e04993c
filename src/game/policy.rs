//! Strategies and the built-in hand-written policies.

use std::fmt;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::game::{Action, GameState, OVERFLOW};

/// Played when a policy has nothing legal to offer; the engine treats it as
/// an illegal attack.
const NO_MOVE: Action = Action::Attack { from: 0, to: 0 };

/// Anything that can pick a move for the player to act.
///
/// Implementations must not keep per-game state: the same strategy is
/// shared read-only between evaluation threads.
pub trait Strategy: Send + Sync + fmt::Debug {
    /// Choose a move for the current player of `state`.
    fn choose(&self, state: &GameState, rng: &mut SmallRng) -> Action;

    /// Make exactly one move on `state`.
    fn play(&self, state: &mut GameState, rng: &mut SmallRng) {
        let action = self.choose(state, rng);
        state.apply(action);
    }
}

/// Shared handle to a strategy.
pub type SharedStrategy = Arc<dyn Strategy>;

/// Uniformly random legal move.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl Strategy for RandomPolicy {
    fn choose(&self, state: &GameState, rng: &mut SmallRng) -> Action {
        random_move(state, rng)
    }
}

/// Knock out a hand when possible, even out a lone hand, otherwise random.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPolicy;

impl Strategy for HeuristicPolicy {
    fn choose(&self, state: &GameState, rng: &mut SmallRng) -> Action {
        let mine = state.hand(state.current_player());
        let theirs = state.hand(state.opponent());

        for (from, to) in [(0u8, 0u8), (0, 1), (1, 0), (1, 1)] {
            if mine[usize::from(from)] + theirs[usize::from(to)] >= OVERFLOW {
                return Action::Attack { from, to };
            }
        }

        let total = mine[0] + mine[1];
        if (mine[0] == 0 || mine[1] == 0) && total >= 2 {
            let left = total / 2;
            return Action::Transfer {
                left,
                right: total - left,
            };
        }

        random_move(state, rng)
    }
}

/// Attack that pushes an opponent hand highest, before overflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy;

impl Strategy for GreedyPolicy {
    fn choose(&self, state: &GameState, rng: &mut SmallRng) -> Action {
        let mine = state.hand(state.current_player());
        let theirs = state.hand(state.opponent());

        let mut best: Option<(u8, Action)> = None;
        for action in state.legal_moves() {
            if let Action::Attack { from, to } = action {
                let pushed = mine[usize::from(from)] + theirs[usize::from(to)];
                if best.is_none_or(|(b, _)| pushed > b) {
                    best = Some((pushed, action));
                }
            }
        }

        best.map_or_else(|| random_move(state, rng), |(_, action)| action)
    }
}

/// Built-in policy selector, used to seed the opponent pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// [`RandomPolicy`].
    Random,
    /// [`HeuristicPolicy`].
    #[default]
    Heuristic,
    /// [`GreedyPolicy`].
    Greedy,
}

impl PolicyKind {
    /// Instantiate the policy.
    #[must_use]
    pub fn build(self) -> SharedStrategy {
        match self {
            Self::Random => Arc::new(RandomPolicy),
            Self::Heuristic => Arc::new(HeuristicPolicy),
            Self::Greedy => Arc::new(GreedyPolicy),
        }
    }
}

/// Pick a uniformly random legal move for the current player.
#[must_use]
pub fn random_move(state: &GameState, rng: &mut SmallRng) -> Action {
    state.legal_moves().choose(rng).copied().unwrap_or(NO_MOVE)
}
