#![no_main]

//! Engine move fuzzer.
//!
//! Applies arbitrary attacks and transfers, legal or not, and checks that
//! the engine never leaves its state space:
//! 1. Stick counts stay below the overflow value
//! 2. Illegal moves zero the mover without advancing the counter
//! 3. Transfers that are accepted keep the mover's total

use arbitrary::Arbitrary;
use chopsticks_gp::game::{Action, GameState, check_invariants};
use libfuzzer_sys::fuzz_target;

/// A fuzzer-generated move.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzMove {
    Attack { from: u8, to: u8 },
    Transfer {
        left: u8,
        right: u8,
    },
}

/// Structured input: a starting position and moves to play from it.
#[derive(Arbitrary, Debug)]
struct MovesInput {
    hands: [[u8; 2]; 2],
    move_count: u8,
    max_moves: u8,
    moves: Vec<FuzzMove>,
}

fuzz_target!(|input: MovesInput| {
    let max_moves = u32::from(input.max_moves).max(1);
    let mut state = GameState::from_hands(input.hands, u32::from(input.move_count), max_moves);

    for fuzz_move in input.moves.into_iter().take(64) {
        if state.is_finished() {
            break;
        }
        let action = match fuzz_move {
            FuzzMove::Attack { from, to } => Action::Attack { from, to },
            FuzzMove::Transfer { left, right } => Action::Transfer { left, right },
        };
        let before = state.clone();
        let me = before.current_player();
        let legal = before.legal_moves().contains(&action);
        state.apply(action);

        if state.move_count() == before.move_count() {
            assert!(!legal, "legal move {action} was rejected");
            assert_eq!(state.hand(me), [0, 0]);
        } else if action.is_attack() {
            assert_eq!(state.hand(me), before.hand(me));
        } else {
            assert_eq!(state.total(me), before.total(me));
        }

        let violations = check_invariants(&state);
        assert!(violations.is_empty(), "{violations:?}");
    }

    if state.is_finished() {
        let outcome = state.outcome().unwrap();
        assert!((0.0..=1.0).contains(&outcome.length));
    }
});
