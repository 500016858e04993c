//! Main evolution loop for genetic programming.
//!
//! Generations run in blocks. Within a block every individual is scored
//! against a fixed opponent pool; between blocks the pool is replaced
//! wholesale by the compiled hall of fame and every cached score is
//! dropped, so later blocks are judged against the best programs found so
//! far.

use log::{info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GpError;
use crate::game::{DEFAULT_MAX_MOVES, PolicyKind};
use crate::gp::crossover::{CrossoverConfig, crossover};
use crate::gp::fitness::{FitnessConfig, FitnessError, OpponentPool, evaluate_population};
use crate::gp::generator::generate_program;
use crate::gp::grammar::Grammar;
use crate::gp::mutation::{MutationConfig, mutate};
use crate::gp::population::{HallOfFame, Individual};
use crate::gp::selection::{FitnessStats, select_tournament};
use crate::gp::tree::TypedNode;

/// Configuration for the evolution process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Contestants per selection tournament.
    pub tournament_size: usize,
    /// Chance that a breeding pair is crossed over.
    pub crossover_probability: f64,
    /// Chance that an individual is mutated.
    pub mutation_probability: f64,
    /// Height above which operator output is discarded.
    pub max_height: usize,
    /// Games per fitness evaluation.
    pub trials: usize,
    /// Generations between opponent pool refreshes.
    pub generations_per_block: usize,
    /// Number of co-evolution blocks.
    pub blocks: usize,
    /// Hall of fame capacity.
    pub hall_of_fame_size: usize,
    /// Move cap per game.
    pub max_moves: u32,
    /// Node-pair draws before crossover gives up.
    pub crossover_attempts: usize,
    /// Policy filling the opponent pool before the first refresh.
    pub initial_opponent: PolicyKind,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 800,
            tournament_size: 10,
            crossover_probability: 0.5,
            mutation_probability: 0.2,
            max_height: 60,
            trials: 25,
            generations_per_block: 10,
            blocks: 5,
            hall_of_fame_size: 10,
            max_moves: DEFAULT_MAX_MOVES,
            crossover_attempts: 16,
            initial_opponent: PolicyKind::Heuristic,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Check that the configuration describes a runnable evolution.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), EvolutionError> {
        let sizes = [
            ("population_size", self.population_size),
            ("tournament_size", self.tournament_size),
            ("max_height", self.max_height),
            ("trials", self.trials),
            ("generations_per_block", self.generations_per_block),
            ("blocks", self.blocks),
            ("hall_of_fame_size", self.hall_of_fame_size),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(EvolutionError::InvalidConfig(format!("{name} must be positive")));
        }
        if self.max_moves == 0 {
            return Err(EvolutionError::InvalidConfig("max_moves must be positive".into()));
        }
        for (name, p) in [
            ("crossover_probability", self.crossover_probability),
            ("mutation_probability", self.mutation_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(EvolutionError::InvalidConfig(format!(
                    "{name} must lie in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }

    /// Settings for fitness evaluation.
    #[must_use]
    pub const fn fitness_config(&self) -> FitnessConfig {
        FitnessConfig {
            trials: self.trials,
            max_moves: self.max_moves,
        }
    }

    /// Settings for crossover.
    #[must_use]
    pub const fn crossover_config(&self) -> CrossoverConfig {
        CrossoverConfig {
            attempts: self.crossover_attempts,
            max_height: self.max_height,
        }
    }

    /// Settings for mutation.
    #[must_use]
    pub const fn mutation_config(&self) -> MutationConfig {
        MutationConfig {
            max_height: self.max_height,
        }
    }

    /// Total number of generations across all blocks.
    #[must_use]
    pub const fn total_generations(&self) -> usize {
        self.blocks * self.generations_per_block
    }
}

/// Error during evolution.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EvolutionError {
    /// The configuration cannot be run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A genetic operator or the compiler failed.
    #[error(transparent)]
    Program(#[from] GpError),

    /// Fitness evaluation failed.
    #[error(transparent)]
    Fitness(#[from] FitnessError),
}

/// Statistics for a single generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number, counted across blocks.
    pub generation: usize,
    /// Co-evolution block the generation belongs to.
    pub block: usize,
    /// Fitness distribution of the evaluated population.
    pub fitness: FitnessStats,
    /// Best hall-of-fame fitness after the update.
    pub hall_of_fame_best: Option<f64>,
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// Final population, evaluated against the last opponent pool.
    pub population: Vec<Individual>,
    /// Best individuals found.
    pub hall_of_fame: HallOfFame,
    /// Statistics per generation.
    pub history: Vec<GenerationStats>,
}

/// A population of random programs.
///
/// # Errors
///
/// Fails if the grammar cannot produce its root type.
pub fn initial_population<R: Rng>(
    grammar: &Grammar,
    size: usize,
    rng: &mut R,
) -> Result<Vec<Individual>, GpError> {
    (0..size)
        .map(|_| generate_program(grammar, rng).map(Individual::new))
        .collect()
}

/// Advance a population by one generation.
///
/// Unevaluated individuals are scored against `pool`, the hall of fame is
/// updated, and the next population is bred by tournament selection,
/// pairwise crossover and mutation. Offspring whose tree an operator
/// changed lose their cached fitness.
///
/// Returns the next population and the fitness distribution of the
/// population that was passed in.
///
/// # Errors
///
/// Fails if evaluation fails or an operator hits a type violation.
pub fn run_generation<R: Rng>(
    mut population: Vec<Individual>,
    hall_of_fame: &mut HallOfFame,
    pool: &OpponentPool,
    grammar: &Grammar,
    config: &EvolutionConfig,
    rng: &mut R,
) -> Result<(Vec<Individual>, FitnessStats), EvolutionError> {
    evaluate_population(&mut population, pool, &config.fitness_config(), rng.next_u64())?;

    let fitness: Vec<f64> = population.iter().map(Individual::fitness_or_zero).collect();
    let stats = FitnessStats::from_fitness(&fitness);
    hall_of_fame.update(&population);

    let mut offspring: Vec<Individual> =
        select_tournament(&fitness, config.tournament_size, population.len(), rng)
            .into_iter()
            .map(|i| population[i].clone())
            .collect();

    let crossover_config = config.crossover_config();
    for pair in offspring.chunks_exact_mut(2) {
        if !rng.gen_bool(config.crossover_probability) {
            continue;
        }
        let (a, b) = crossover(&pair[0].tree, &pair[1].tree, &crossover_config, rng)?;
        replace_tree(&mut pair[0], a);
        replace_tree(&mut pair[1], b);
    }

    let mutation_config = config.mutation_config();
    for individual in &mut offspring {
        if rng.gen_bool(config.mutation_probability) {
            let mutant = mutate(&individual.tree, grammar, &mutation_config, rng)?;
            replace_tree(individual, mutant);
        }
    }

    Ok((offspring, stats))
}

fn replace_tree(individual: &mut Individual, tree: TypedNode) {
    if individual.tree != tree {
        individual.tree = tree;
        individual.invalidate();
    }
}

/// Stateful co-evolution run.
#[derive(Debug)]
pub struct Evolution {
    config: EvolutionConfig,
    grammar: Grammar,
    population: Vec<Individual>,
    hall_of_fame: HallOfFame,
    pool: OpponentPool,
    rng: SmallRng,
    generation: usize,
    history: Vec<GenerationStats>,
}

impl Evolution {
    /// Start a run over the Chopsticks grammar.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration.
    pub fn new(config: EvolutionConfig) -> Result<Self, EvolutionError> {
        Self::with_grammar(config, Grammar::chopsticks())
    }

    /// Start a run over a custom grammar.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or a grammar that cannot produce
    /// its root type.
    pub fn with_grammar(config: EvolutionConfig, grammar: Grammar) -> Result<Self, EvolutionError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let population = initial_population(&grammar, config.population_size, &mut rng)?;
        info!(
            "starting evolution: {} individuals, {} blocks of {} generations, opponent {:?}",
            config.population_size,
            config.blocks,
            config.generations_per_block,
            config.initial_opponent
        );
        Ok(Self {
            hall_of_fame: HallOfFame::new(config.hall_of_fame_size),
            pool: OpponentPool::from_policy(config.initial_opponent),
            config,
            grammar,
            population,
            rng,
            generation: 0,
            history: Vec::new(),
        })
    }

    /// Run one generation.
    ///
    /// # Errors
    ///
    /// See [`run_generation`].
    pub fn step(&mut self) -> Result<GenerationStats, EvolutionError> {
        let population = std::mem::take(&mut self.population);
        let (next, fitness) = run_generation(
            population,
            &mut self.hall_of_fame,
            &self.pool,
            &self.grammar,
            &self.config,
            &mut self.rng,
        )?;
        self.population = next;

        let stats = GenerationStats {
            generation: self.generation,
            block: self.generation / self.config.generations_per_block,
            fitness,
            hall_of_fame_best: self.hall_of_fame.best().and_then(|b| b.fitness),
        };
        info!(
            "generation {} (block {}): min={:.3} mean={:.3} median={:.3} max={:.3} hof_best={:.3}",
            stats.generation,
            stats.block,
            fitness.min,
            fitness.mean,
            fitness.median,
            fitness.max,
            stats.hall_of_fame_best.unwrap_or(0.0)
        );
        self.history.push(stats);
        self.generation += 1;
        Ok(stats)
    }

    /// Replace the opponent pool by the compiled hall of fame and drop
    /// every cached fitness.
    ///
    /// Hall-of-fame members keep the fitness they earned against the
    /// opponents of their own block. Later blocks play against those same
    /// members, so newcomers must beat an older, easier score to enter and
    /// the hall of fame can stop changing once it is full of strong
    /// programs. An empty hall of fame leaves the pool as it is.
    ///
    /// # Errors
    ///
    /// Fails if a hall-of-fame member does not compile.
    pub fn refresh_opponents(&mut self) -> Result<(), EvolutionError> {
        if self.hall_of_fame.is_empty() {
            warn!("hall of fame is empty, keeping the current opponent pool");
            return Ok(());
        }
        self.pool = OpponentPool::from_hall_of_fame(&self.hall_of_fame)?;
        self.population.iter_mut().for_each(Individual::invalidate);
        info!(
            "opponent pool refreshed with {} hall-of-fame programs",
            self.pool.len()
        );
        Ok(())
    }

    /// Run every block to completion.
    ///
    /// # Errors
    ///
    /// See [`Evolution::step`].
    pub fn run(self) -> Result<EvolutionResult, EvolutionError> {
        self.run_with(|_| {})
    }

    /// Run every block, reporting each generation to `observer`.
    ///
    /// The pool is refreshed between blocks, not after the last one.
    ///
    /// # Errors
    ///
    /// See [`Evolution::step`].
    pub fn run_with(
        mut self,
        mut observer: impl FnMut(&GenerationStats),
    ) -> Result<EvolutionResult, EvolutionError> {
        for block in 0..self.config.blocks {
            if block > 0 {
                self.refresh_opponents()?;
            }
            for _ in 0..self.config.generations_per_block {
                let stats = self.step()?;
                observer(&stats);
            }
        }
        self.finish()
    }

    /// Score the current population and hand back the result.
    ///
    /// # Errors
    ///
    /// Fails if evaluation fails.
    pub fn finish(mut self) -> Result<EvolutionResult, EvolutionError> {
        let seed = self.rng.next_u64();
        evaluate_population(
            &mut self.population,
            &self.pool,
            &self.config.fitness_config(),
            seed,
        )?;
        self.hall_of_fame.update(&self.population);
        Ok(EvolutionResult {
            population: self.population,
            hall_of_fame: self.hall_of_fame,
            history: self.history,
        })
    }

    /// Current population.
    #[must_use]
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Hall of fame so far.
    #[must_use]
    pub const fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    /// Opponents currently used for evaluation.
    #[must_use]
    pub const fn opponents(&self) -> &OpponentPool {
        &self.pool
    }

    /// Generations completed.
    #[must_use]
    pub const fn generation(&self) -> usize {
        self.generation
    }

    /// Configuration of the run.
    #[must_use]
    pub const fn config(&self) -> &EvolutionConfig {
        &self.config
    }
}

/// Run a full co-evolution and return the final population and hall of fame.
///
/// # Errors
///
/// Fails on an invalid configuration or an evaluation failure.
pub fn evolve(config: EvolutionConfig) -> Result<EvolutionResult, EvolutionError> {
    Evolution::new(config)?.run()
}
