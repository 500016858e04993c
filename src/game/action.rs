//! Move descriptions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A move chosen by a player, described but not yet applied.
///
/// Strategies construct actions; [`GameState::apply`](crate::game::GameState::apply)
/// executes them. Keeping the two apart lets one compiled program drive any
/// number of independent engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Add the acting player's `from` hand onto the opponent's `to` hand.
    Attack {
        /// Acting player's hand index (0 or 1).
        from: u8,
        /// Opponent's hand index (0 or 1).
        to: u8,
    },
    /// Redistribute the acting player's sticks as `[left, right]`.
    Transfer {
        /// New stick count of the left hand.
        left: u8,
        /// New stick count of the right hand.
        right: u8,
    },
}

impl Action {
    /// Whether this is an attack.
    #[must_use]
    pub const fn is_attack(&self) -> bool {
        matches!(self, Self::Attack { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attack { from, to } => write!(f, "attack({from} -> {to})"),
            Self::Transfer { left, right } => write!(f, "transfer({left}, {right})"),
        }
    }
}
