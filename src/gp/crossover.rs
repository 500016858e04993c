//! Type-safe subtree crossover.
//!
//! One node is drawn uniformly from each parent. Only nodes returning the
//! same type may be exchanged; incompatible draws are retried a bounded
//! number of times before giving up and returning the parents unchanged.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GpError, GpResult};
use crate::gp::grammar::SemanticType;
use crate::gp::tree::{TypedNode, limit_height};

/// Configuration for crossover operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverConfig {
    /// Draws of a node pair before crossover becomes a no-op.
    pub attempts: usize,
    /// Offspring taller than this are replaced by their parent.
    pub max_height: usize,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            attempts: 16,
            max_height: 60,
        }
    }
}

/// Exchange one type-compatible subtree between two parents.
///
/// The first offspring descends from `parent1`, the second from `parent2`.
/// An offspring exceeding `max_height` is replaced by a copy of its parent.
///
/// # Errors
///
/// Only on an internal type violation, which aborts the operation.
pub fn crossover<R: Rng>(
    parent1: &TypedNode,
    parent2: &TypedNode,
    config: &CrossoverConfig,
    rng: &mut R,
) -> GpResult<(TypedNode, TypedNode)> {
    let Some((i, j)) = pick_compatible(parent1, parent2, config.attempts, rng) else {
        debug!("no type-compatible crossover points after {} attempts", config.attempts);
        return Ok((parent1.clone(), parent2.clone()));
    };

    let (child1, child2) = swap_subtrees(parent1, i, parent2, j)?;
    Ok((
        limit_height(child1, parent1, config.max_height),
        limit_height(child2, parent2, config.max_height),
    ))
}

/// Swap the subtree at `i` in `a` with the subtree at `j` in `b`.
///
/// # Errors
///
/// Fails if either index is missing or the two subtrees differ in type.
pub fn swap_subtrees(
    a: &TypedNode,
    i: usize,
    b: &TypedNode,
    j: usize,
) -> GpResult<(TypedNode, TypedNode)> {
    let size_a = a.size();
    let size_b = b.size();
    let donor_a = a
        .get(i)
        .cloned()
        .ok_or(GpError::IndexOutOfRange {
            index: i,
            size: size_a,
        })?;
    let donor_b = b
        .get(j)
        .cloned()
        .ok_or(GpError::IndexOutOfRange {
            index: j,
            size: size_b,
        })?;

    let mut child_a = a.clone();
    let mut child_b = b.clone();
    child_a.replace(i, donor_b)?;
    child_b.replace(j, donor_a)?;
    Ok((child_a, child_b))
}

/// Draw preorder indices with equal return types, if any draw succeeds.
fn pick_compatible<R: Rng>(
    a: &TypedNode,
    b: &TypedNode,
    attempts: usize,
    rng: &mut R,
) -> Option<(usize, usize)> {
    let types_a: Vec<SemanticType> = a.preorder().map(TypedNode::return_type).collect();
    let types_b: Vec<SemanticType> = b.preorder().map(TypedNode::return_type).collect();

    (0..attempts).find_map(|_| {
        let i = rng.gen_range(0..types_a.len());
        let j = rng.gen_range(0..types_b.len());
        (types_a[i] == types_b[j]).then_some((i, j))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::generate_program;
    use crate::gp::grammar::{Constant, Grammar};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn parse(text: &str) -> TypedNode {
        text.parse().unwrap()
    }

    #[test]
    fn test_swap_subtrees() {
        let a = parse("if_then_else(my_hand_less(0, 2), attack(0, 0), transfer(1))");
        let b = parse("attack(1, 1)");
        let (ca, cb) = swap_subtrees(&a, 4, &b, 0).unwrap();
        assert_eq!(
            ca.to_string(),
            "if_then_else(my_hand_less(0, 2), attack(1, 1), transfer(1))"
        );
        assert_eq!(cb.to_string(), "attack(0, 0)");
    }

    #[test]
    fn test_swap_rejects_type_mismatch() {
        let a = parse("attack(0, 1)");
        let b = parse("transfer(3)");
        // HandIndex against HandValue
        assert!(swap_subtrees(&a, 1, &b, 1).is_err());
    }

    #[test]
    fn test_crossover_preserves_types() {
        let grammar = Grammar::chopsticks();
        let mut rng = SmallRng::seed_from_u64(42);
        let config = CrossoverConfig::default();
        for _ in 0..200 {
            let p1 = generate_program(&grammar, &mut rng).unwrap();
            let p2 = generate_program(&grammar, &mut rng).unwrap();
            let (c1, c2) = crossover(&p1, &p2, &config, &mut rng).unwrap();
            c1.check().unwrap();
            c2.check().unwrap();
            assert_eq!(c1.return_type(), SemanticType::Statement);
            assert_eq!(c2.return_type(), SemanticType::Statement);
            assert_eq!(c1.size() + c2.size(), p1.size() + p2.size());
        }
    }

    #[test]
    fn test_incompatible_parents_are_returned() {
        let mut rng = SmallRng::seed_from_u64(3);
        let index = TypedNode::constant(Constant::HandIndex(1));
        let value = TypedNode::constant(Constant::HandValue(4));
        let config = CrossoverConfig::default();
        let (c1, c2) = crossover(&index, &value, &config, &mut rng).unwrap();
        assert_eq!(c1, index);
        assert_eq!(c2, value);

        let a = parse("attack(0, 1)");
        let b = parse("opp_hand_equal(1, 4)");
        let no_attempts = CrossoverConfig {
            attempts: 0,
            max_height: 60,
        };
        let (c1, c2) = crossover(&a, &b, &no_attempts, &mut rng).unwrap();
        assert_eq!(c1, a);
        assert_eq!(c2, b);
    }

    #[test]
    fn test_height_limit_returns_parents() {
        let mut rng = SmallRng::seed_from_u64(9);
        let a = parse("if_then_else_nested(my_hand_less(0, 2), attack(0, 0), \
                       if_then_else(my_hand_less(1, 1), attack(1, 1), attack(0, 1)))");
        let b = parse("attack(1, 0)");
        let config = CrossoverConfig {
            attempts: 64,
            max_height: 1,
        };
        for _ in 0..50 {
            let (c1, c2) = crossover(&b, &a, &config, &mut rng).unwrap();
            assert!(c1.height() <= 1 || c1 == b);
            assert!(c2.height() <= 1 || c2 == a);
        }
    }
}
