//! Selection operators and fitness statistics.
//!
//! The breeding pool is filled by tournament selection: draw `k` indices
//! uniformly with replacement, keep the fittest, repeat.

// Statistics divide by population counts
#![allow(clippy::cast_precision_loss)]

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fill a breeding pool of `count` indices by tournament selection.
#[must_use]
pub fn select_tournament<R: Rng>(
    fitness: &[f64],
    tournament_size: usize,
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    if fitness.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| tournament_select(fitness, tournament_size, rng))
        .collect()
}

/// Tournament selection: randomly select k individuals and return the best.
///
/// Ties keep the earliest draw. `fitness` must be non-empty.
pub(crate) fn tournament_select<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    let pop_size = fitness.len();
    let mut best_idx = rng.gen_range(0..pop_size);
    let mut best_fitness = fitness[best_idx];

    for _ in 1..k.max(1) {
        let idx = rng.gen_range(0..pop_size);
        if fitness[idx] > best_fitness {
            best_idx = idx;
            best_fitness = fitness[idx];
        }
    }

    best_idx
}

/// Summary of one generation's fitness distribution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessStats {
    /// Lowest fitness.
    pub min: f64,
    /// Mean fitness.
    pub mean: f64,
    /// Median fitness; the mean of the middle pair for even counts.
    pub median: f64,
    /// Highest fitness.
    pub max: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl FitnessStats {
    /// Calculate statistics from fitness values.
    ///
    /// An empty slice yields all zeros.
    #[must_use]
    pub fn from_fitness(fitness: &[f64]) -> Self {
        if fitness.is_empty() {
            return Self::default();
        }

        let n = fitness.len() as f64;
        let mean = fitness.iter().sum::<f64>() / n;
        let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = fitness.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            f64::midpoint(sorted[mid - 1], sorted[mid])
        } else {
            sorted[mid]
        };

        Self {
            min: sorted[0],
            mean,
            median,
            max: sorted[sorted.len() - 1],
            std: variance.sqrt(),
        }
    }
}
