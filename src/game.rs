//! Game layer: the rules of Chopsticks.
//!
//! Two players each hold two hands of one to four sticks. On a turn a
//! player either adds one of their hands onto an opponent hand (a hand
//! reaching five is knocked out) or redistributes their own sticks. A
//! player left with no sticks loses.
//!
//! - [`GameState`] enforces the rules and answers terminal queries
//! - [`Action`] describes a move without applying it
//! - [`Strategy`] is implemented by built-in policies and compiled programs

mod action;
mod invariants;
mod policy;
mod state;

pub use action::Action;
pub use invariants::{InvariantViolation, check_invariants};
pub use policy::{
    GreedyPolicy, HeuristicPolicy, PolicyKind, RandomPolicy, SharedStrategy, Strategy, random_move,
};
pub use state::{DEFAULT_MAX_MOVES, GameState, OVERFLOW, Outcome, STARTING_STICKS, Seat};
