//! Strongly typed genetic programming for Chopsticks strategies.
//!
//! Programs are trees over a small grammar of conditionals, hand
//! comparisons and move constructors. Every tree is well typed by
//! construction, and every operator that edits trees preserves that.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Co-evolution blocks (Evolution)   │
//! ├─────────────────────────────────────┤
//! │  Selection │ Crossover │ Mutation   │
//! ├─────────────────────────────────────┤
//! │  Fitness vs. opponent pool (rayon)  │
//! ├─────────────────────────────────────┤
//! │  TypedNode → Program compiler       │
//! ├─────────────────────────────────────┤
//! │  Grammar │ Generator │ Text form    │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chopsticks_gp::gp::{EvolutionConfig, evolve};
//!
//! let config = EvolutionConfig {
//!     population_size: 100,
//!     seed: Some(7),
//!     ..EvolutionConfig::default()
//! };
//! let result = evolve(config)?;
//! if let Some(best) = result.hall_of_fame.best() {
//!     println!("{}", best.tree);
//! }
//! # Ok::<(), chopsticks_gp::gp::EvolutionError>(())
//! ```

mod compiler;
mod crossover;
mod evolution;
mod fitness;
mod generator;
mod grammar;
mod mutation;
mod persistence;
mod population;
mod selection;
mod text;
mod tree;

pub use compiler::{Program, compile};
pub use crossover::{CrossoverConfig, crossover, swap_subtrees};
pub use evolution::{
    Evolution, EvolutionConfig, EvolutionError, EvolutionResult, GenerationStats,
    initial_population, run_generation, evolve,
};
pub use fitness::{
    CANDIDATE_SEAT, FitnessConfig, FitnessError, FitnessResult, OpponentPool, evaluate,
    evaluate_population, evaluate_tree, play_game,
};
pub use generator::{generate, generate_prefix, generate_program};
pub use grammar::{
    Comparison, Constant, Grammar, Primitive, Productions, SemanticType, Side, Symbol, Terminal,
};
pub use mutation::{MutationConfig, mutate};
pub use persistence::{
    HallOfFameRecord, PersistenceError, hall_of_fame_records, load_hall_of_fame,
    save_hall_of_fame,
};
pub use population::{HallOfFame, Individual};
pub use selection::{FitnessStats, select_tournament};
pub use text::{MAX_NESTING, parse_program};
pub use tree::{TypedNode, limit_height};
