//! Individuals and the hall of fame.

use serde::{Deserialize, Serialize};

use crate::gp::tree::TypedNode;

/// A program tree with its cached fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// The program.
    pub tree: TypedNode,
    /// Fitness from the last evaluation; `None` until evaluated.
    pub fitness: Option<f64>,
}

impl Individual {
    /// Wrap an unevaluated tree.
    #[must_use]
    pub const fn new(tree: TypedNode) -> Self {
        Self {
            tree,
            fitness: None,
        }
    }

    /// Whether a fitness value is cached.
    #[must_use]
    pub const fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Drop the cached fitness.
    pub fn invalidate(&mut self) {
        self.fitness = None;
    }

    /// Cached fitness, with unevaluated individuals ranking lowest.
    #[must_use]
    pub fn fitness_or_zero(&self) -> f64 {
        self.fitness.unwrap_or(0.0)
    }
}

/// The best individuals ever observed, fittest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallOfFame {
    capacity: usize,
    members: Vec<Individual>,
}

impl HallOfFame {
    /// An empty hall holding at most `capacity` members.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            members: Vec::new(),
        }
    }

    /// Offer every evaluated individual of a population.
    ///
    /// An individual enters when the hall has room or it beats the current
    /// weakest member; the weakest is evicted once over capacity. A tree
    /// already present is not added twice. Returns how many entered.
    pub fn update(&mut self, population: &[Individual]) -> usize {
        let mut entered = 0;
        for individual in population {
            let Some(fitness) = individual.fitness else {
                continue;
            };
            let full = self.members.len() >= self.capacity;
            if full && self.min_fitness().is_none_or(|min| fitness <= min) {
                continue;
            }
            if self.capacity == 0 || self.members.iter().any(|m| m.tree == individual.tree) {
                continue;
            }

            // after existing members of equal fitness
            let at = self
                .members
                .partition_point(|m| m.fitness_or_zero() >= fitness);
            self.members.insert(at, individual.clone());
            self.members.truncate(self.capacity);
            entered += 1;
        }
        entered
    }

    /// Fittest member.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.members.first()
    }

    /// Fitness of the weakest retained member.
    #[must_use]
    pub fn min_fitness(&self) -> Option<f64> {
        self.members.last().map(Individual::fitness_or_zero)
    }

    /// Members, fittest first.
    #[must_use]
    pub fn members(&self) -> &[Individual] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the hall is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Maximum number of members.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual(text: &str, fitness: f64) -> Individual {
        Individual {
            tree: text.parse().unwrap(),
            fitness: Some(fitness),
        }
    }

    #[test]
    fn test_individual_cache() {
        let mut ind = Individual::new("attack(0, 0)".parse().unwrap());
        assert!(!ind.is_evaluated());
        ind.fitness = Some(0.5);
        assert!(ind.is_evaluated());
        ind.invalidate();
        assert_eq!(ind.fitness, None);
    }

    #[test]
    fn test_hall_orders_by_fitness() {
        let mut hof = HallOfFame::new(3);
        hof.update(&[
            individual("attack(0, 0)", 0.2),
            individual("attack(0, 1)", 0.9),
            individual("attack(1, 0)", 0.5),
        ]);
        let fitness: Vec<_> = hof.members().iter().map(|m| m.fitness).collect();
        assert_eq!(fitness, vec![Some(0.9), Some(0.5), Some(0.2)]);
        assert_eq!(hof.best().unwrap().tree.to_string(), "attack(0, 1)");
    }

    #[test]
    fn test_hall_evicts_weakest() {
        let mut hof = HallOfFame::new(2);
        hof.update(&[individual("attack(0, 0)", 0.2), individual("attack(0, 1)", 0.4)]);
        assert_eq!(hof.update(&[individual("attack(1, 0)", 0.1)]), 0);
        assert_eq!(hof.update(&[individual("attack(1, 1)", 0.3)]), 1);
        let texts: Vec<_> = hof.members().iter().map(|m| m.tree.to_string()).collect();
        assert_eq!(texts, vec!["attack(0, 1)", "attack(1, 1)"]);
        assert_eq!(hof.len(), 2);
    }

    #[test]
    fn test_hall_requires_strict_improvement_when_full() {
        let mut hof = HallOfFame::new(1);
        hof.update(&[individual("attack(0, 0)", 0.5)]);
        assert_eq!(hof.update(&[individual("attack(0, 1)", 0.5)]), 0);
        assert_eq!(hof.best().unwrap().tree.to_string(), "attack(0, 0)");
    }

    #[test]
    fn test_hall_skips_duplicates_and_unevaluated() {
        let mut hof = HallOfFame::new(5);
        let unevaluated = Individual::new("transfer(2)".parse().unwrap());
        hof.update(&[
            individual("attack(0, 0)", 0.5),
            individual("attack(0, 0)", 0.7),
            unevaluated,
        ]);
        assert_eq!(hof.len(), 1);
    }

    #[test]
    fn test_zero_capacity() {
        let mut hof = HallOfFame::new(0);
        assert_eq!(hof.update(&[individual("attack(0, 0)", 1.0)]), 0);
        assert!(hof.is_empty());
        assert_eq!(hof.capacity(), 0);
    }
}
