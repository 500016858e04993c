//! CLI command implementations.

pub(crate) mod evolve;
pub(crate) mod play;

use chopsticks_gp::game::PolicyKind;
use clap::ValueEnum;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Built-in opponent for the `play` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Opponent {
    /// Uniformly random legal moves.
    Random,
    /// Knockouts first, then evening out, then random.
    Heuristic,
    /// Always pushes an opponent hand as high as possible.
    Greedy,
}

impl From<Opponent> for PolicyKind {
    fn from(opponent: Opponent) -> Self {
        match opponent {
            Opponent::Random => Self::Random,
            Opponent::Heuristic => Self::Heuristic,
            Opponent::Greedy => Self::Greedy,
        }
    }
}

/// Seeded generator, or one seeded from the OS.
pub(crate) fn rng_from(seed: Option<u64>) -> SmallRng {
    seed.map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64)
}
