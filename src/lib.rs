// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Chopsticks-GP: strongly typed genetic programming with co-evolutionary
//! self-play for the hand game Chopsticks.
//!
//! This crate provides:
//! - A deterministic two-player Chopsticks engine with explicit move values
//! - A typed grammar, random program generator and tree compiler
//! - Type-safe crossover and mutation with bloat control
//! - A parallel co-evolution loop whose opponents are its own hall of fame
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     Evolution (gp::Evolution)       │
//! ├─────────────────────────────────────┤
//! │   Typed programs (gp::TypedNode)    │
//! ├─────────────────────────────────────┤
//! │      Game engine (game::GameState)  │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod game;
pub mod gp;

pub use error::{GpError, GpResult};

// Re-export key game types at crate root for convenience
pub use game::{Action, GameState, Strategy};

/// Engine for one game with the given move cap.
#[must_use]
pub const fn create_engine(max_moves: u32) -> GameState {
    GameState::new(max_moves)
}
