//! Game invariants - sanity checks that detect engine bugs.
//!
//! These should never trigger: stick counts are bounded by the overflow
//! rule and the move counter by the move budget.

use crate::game::{GameState, OVERFLOW};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (seat, hand) in state.hands().iter().enumerate() {
        for (index, &sticks) in hand.iter().enumerate() {
            if sticks >= OVERFLOW {
                violations.push(InvariantViolation {
                    message: format!(
                        "seat {seat} hand {index} holds {sticks} sticks (overflow is {OVERFLOW})"
                    ),
                });
            }
        }
    }

    if state.move_count() > state.max_moves() {
        violations.push(InvariantViolation {
            message: format!(
                "move count {} exceeds budget {}",
                state.move_count(),
                state.max_moves()
            ),
        });
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameState, RandomPolicy, Strategy};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_fresh_game_is_clean() {
        assert!(check_invariants(&GameState::new(100)).is_empty());
    }

    #[test]
    fn test_random_games_stay_clean() {
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..100 {
            let mut state = GameState::new(60);
            while !state.is_finished() {
                RandomPolicy.play(&mut state, &mut rng);
                let violations = check_invariants(&state);
                assert!(violations.is_empty(), "{violations:?}");
            }
        }
    }

    #[test]
    fn test_violation_display() {
        let v = InvariantViolation {
            message: "oops".to_string(),
        };
        assert_eq!(v.to_string(), "Invariant violation: oops");
    }
}
