//! Fitness evaluation for genetic programming.
//!
//! A candidate plays repeated games against opponents drawn from the
//! current pool and is scored by its win rate. Scores are sampled
//! estimates: opponent draws and random fallback moves make two
//! evaluations of the same program differ.

// Fitness evaluation divides counts into rates
#![allow(clippy::cast_precision_loss)]

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GpError;
use crate::game::{
    DEFAULT_MAX_MOVES, GameState, Outcome, PolicyKind, SharedStrategy, Strategy, check_invariants,
};
use crate::gp::compiler::compile;
use crate::gp::population::{HallOfFame, Individual};
use crate::gp::tree::TypedNode;

/// Seat the candidate always occupies; it moves first.
pub const CANDIDATE_SEAT: usize = 0;

/// Configuration for fitness evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessConfig {
    /// Number of games per evaluation.
    pub trials: usize,
    /// Move cap per game.
    pub max_moves: u32,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            trials: 25,
            max_moves: DEFAULT_MAX_MOVES,
        }
    }
}

/// Result of a fitness evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessResult {
    /// Fraction of games won, in [0, 1]. This is the fitness.
    pub win_rate: f64,
    /// Mean normalized game length, in [0, 1]. Not part of the fitness.
    pub mean_length: f64,
    /// Number of games played.
    pub trials: usize,
}

/// Error during fitness evaluation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FitnessError {
    /// There is nobody to play against.
    #[error("opponent pool is empty")]
    EmptyOpponentPool,

    /// The candidate did not compile.
    #[error("program error: {0}")]
    Program(#[from] GpError),
}

/// Strategies that play the second seat during evaluation.
///
/// Read-only while a generation is evaluated; replaced between blocks.
#[derive(Debug, Clone, Default)]
pub struct OpponentPool {
    opponents: Vec<SharedStrategy>,
}

impl OpponentPool {
    /// A pool of the given strategies.
    #[must_use]
    pub const fn new(opponents: Vec<SharedStrategy>) -> Self {
        Self { opponents }
    }

    /// A pool with one built-in policy.
    #[must_use]
    pub fn from_policy(kind: PolicyKind) -> Self {
        Self::new(vec![kind.build()])
    }

    /// Compile every hall-of-fame member into a pool.
    ///
    /// # Errors
    ///
    /// Returns the first compilation failure.
    pub fn from_hall_of_fame(hall_of_fame: &HallOfFame) -> Result<Self, GpError> {
        let opponents = hall_of_fame
            .members()
            .iter()
            .map(|member| compile(&member.tree).map(|p| Arc::new(p) as SharedStrategy))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(opponents))
    }

    /// Uniformly drawn opponent.
    pub fn sample(&self, rng: &mut SmallRng) -> Option<&dyn Strategy> {
        self.opponents.choose(rng).map(AsRef::as_ref)
    }

    /// Number of opponents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.opponents.len()
    }

    /// Whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opponents.is_empty()
    }
}

/// Play one game from the opening position, candidate first.
pub fn play_game(
    candidate: &dyn Strategy,
    opponent: &dyn Strategy,
    max_moves: u32,
    rng: &mut SmallRng,
) -> Outcome {
    let mut state = GameState::new(max_moves);
    let players = [candidate, opponent];
    loop {
        if let Some(outcome) = state.outcome() {
            debug_assert!(check_invariants(&state).is_empty());
            return outcome;
        }
        players[state.current_player()].play(&mut state, rng);
    }
}

/// Evaluate a compiled candidate against the pool.
///
/// # Errors
///
/// Returns [`FitnessError::EmptyOpponentPool`] if the pool is empty.
pub fn evaluate(
    candidate: &dyn Strategy,
    pool: &OpponentPool,
    config: &FitnessConfig,
    rng: &mut SmallRng,
) -> Result<FitnessResult, FitnessError> {
    if pool.is_empty() {
        return Err(FitnessError::EmptyOpponentPool);
    }

    let mut wins = 0usize;
    let mut length = 0.0;
    for _ in 0..config.trials {
        let Some(opponent) = pool.sample(rng) else {
            return Err(FitnessError::EmptyOpponentPool);
        };
        let outcome = play_game(candidate, opponent, config.max_moves, rng);
        if outcome.winner == CANDIDATE_SEAT {
            wins += 1;
        }
        length += outcome.length;
    }

    let trials = config.trials.max(1) as f64;
    Ok(FitnessResult {
        win_rate: wins as f64 / trials,
        mean_length: length / trials,
        trials: config.trials,
    })
}

/// Compile a tree and evaluate it.
///
/// # Errors
///
/// Fails if the tree does not compile or the pool is empty.
pub fn evaluate_tree(
    tree: &TypedNode,
    pool: &OpponentPool,
    config: &FitnessConfig,
    rng: &mut SmallRng,
) -> Result<FitnessResult, FitnessError> {
    let program = compile(tree)?;
    evaluate(&program, pool, config, rng)
}

/// Evaluate every individual lacking a cached fitness, in parallel.
///
/// Individual `i` plays with its own generator seeded from `seed` and `i`,
/// so results do not depend on thread scheduling. Returns how many
/// individuals were evaluated.
///
/// # Errors
///
/// Returns the first evaluation failure.
pub fn evaluate_population(
    population: &mut [Individual],
    pool: &OpponentPool,
    config: &FitnessConfig,
    seed: u64,
) -> Result<usize, FitnessError> {
    if pool.is_empty() {
        return Err(FitnessError::EmptyOpponentPool);
    }

    population
        .par_iter_mut()
        .enumerate()
        .filter(|(_, individual)| !individual.is_evaluated())
        .map(|(i, individual)| {
            let mut rng = SmallRng::seed_from_u64(stream_seed(seed, i));
            let result = evaluate_tree(&individual.tree, pool, config, &mut rng)?;
            individual.fitness = Some(result.win_rate);
            Ok::<usize, FitnessError>(1)
        })
        .sum()
}

fn stream_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GreedyPolicy, RandomPolicy};

    fn tree(text: &str) -> TypedNode {
        text.parse().unwrap()
    }

    #[test]
    fn test_fitness_config_default() {
        let config = FitnessConfig::default();
        assert_eq!(config.trials, 25);
        assert_eq!(config.max_moves, 100);
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let mut rng = SmallRng::seed_from_u64(1);
        let pool = OpponentPool::default();
        let err = evaluate(&RandomPolicy, &pool, &FitnessConfig::default(), &mut rng).unwrap_err();
        assert!(matches!(err, FitnessError::EmptyOpponentPool));
    }

    #[test]
    fn test_win_rate_in_unit_interval() {
        let mut rng = SmallRng::seed_from_u64(2);
        let pool = OpponentPool::from_policy(PolicyKind::Random);
        let config = FitnessConfig {
            trials: 50,
            max_moves: 100,
        };
        let result = evaluate_tree(&tree("attack(0, 0)"), &pool, &config, &mut rng).unwrap();
        assert!((0.0..=1.0).contains(&result.win_rate));
        assert!((0.0..=1.0).contains(&result.mean_length));
        assert_eq!(result.trials, 50);
    }

    #[test]
    fn test_self_eliminating_program_never_wins() {
        // transfer(4) with a total of 2 is illegal: the candidate wipes
        // itself out on its first move
        let mut rng = SmallRng::seed_from_u64(3);
        let pool = OpponentPool::from_policy(PolicyKind::Random);
        let config = FitnessConfig::default();
        let result = evaluate_tree(&tree("transfer(4)"), &pool, &config, &mut rng).unwrap();
        assert!(result.win_rate.abs() < f64::EPSILON);
        assert!(result.mean_length.abs() < f64::EPSILON);
    }

    #[test]
    fn test_play_game_reaches_terminal_state() {
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..100 {
            let outcome = play_game(&GreedyPolicy, &RandomPolicy, 100, &mut rng);
            assert!(outcome.winner <= 1);
            assert!((0.0..=1.0).contains(&outcome.length));
        }
    }

    #[test]
    fn test_evaluate_population_fills_missing_fitness() {
        let pool = OpponentPool::from_policy(PolicyKind::Heuristic);
        let config = FitnessConfig {
            trials: 5,
            max_moves: 100,
        };
        let mut population = vec![
            Individual::new(tree("attack(0, 0)")),
            Individual {
                tree: tree("attack(1, 1)"),
                fitness: Some(0.42),
            },
            Individual::new(tree("transfer(2)")),
        ];
        let evaluated = evaluate_population(&mut population, &pool, &config, 7).unwrap();
        assert_eq!(evaluated, 2);
        assert!(population.iter().all(Individual::is_evaluated));
        assert_eq!(population[1].fitness, Some(0.42));
    }

    #[test]
    fn test_evaluate_population_is_deterministic() {
        let pool = OpponentPool::from_policy(PolicyKind::Random);
        let config = FitnessConfig::default();
        let fresh = || {
            ["attack(0, 1)", "attack(1, 0)", "transfer(1)"]
                .map(|t| Individual::new(tree(t)))
                .to_vec()
        };
        let mut a = fresh();
        let mut b = fresh();
        evaluate_population(&mut a, &pool, &config, 99).unwrap();
        evaluate_population(&mut b, &pool, &config, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pool_from_hall_of_fame() {
        let mut hof = HallOfFame::new(4);
        hof.update(&[
            Individual {
                tree: tree("attack(0, 0)"),
                fitness: Some(0.5),
            },
            Individual {
                tree: tree("if_then_else(my_hand_less(0, 1), transfer(1), attack(0, 1))"),
                fitness: Some(0.6),
            },
        ]);
        let pool = OpponentPool::from_hall_of_fame(&hof).unwrap();
        assert_eq!(pool.len(), 2);
        let mut rng = SmallRng::seed_from_u64(5);
        assert!(pool.sample(&mut rng).is_some());
    }
}
