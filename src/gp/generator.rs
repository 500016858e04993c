//! Random program generation.
//!
//! Generation keeps a stack of type obligations. Each step pops one,
//! draws uniformly among every terminal and primitive returning that type,
//! and pushes a primitive's argument types in reverse so arguments expand
//! left to right. The result is a preorder symbol sequence that
//! [`TypedNode::from_prefix`] turns back into a tree.

use rand::Rng;

use crate::error::{GpError, GpResult};
use crate::gp::grammar::{Grammar, SemanticType, Symbol};
use crate::gp::tree::TypedNode;

/// Generate a random tree of type `root`.
///
/// # Errors
///
/// Returns [`GpError::NoProductions`] if some required type has no symbol
/// in the grammar.
pub fn generate<R: Rng>(grammar: &Grammar, root: SemanticType, rng: &mut R) -> GpResult<TypedNode> {
    let prefix = generate_prefix(grammar, root, rng)?;
    TypedNode::from_prefix(&prefix)
}

/// Generate a random program rooted at the grammar's root type.
///
/// # Errors
///
/// See [`generate`].
pub fn generate_program<R: Rng>(grammar: &Grammar, rng: &mut R) -> GpResult<TypedNode> {
    generate(grammar, grammar.root(), rng)
}

/// Generate the preorder symbol sequence of a random tree of type `root`.
///
/// Ephemeral constants are drawn as soon as their terminal is chosen.
///
/// # Errors
///
/// See [`generate`].
pub fn generate_prefix<R: Rng>(
    grammar: &Grammar,
    root: SemanticType,
    rng: &mut R,
) -> GpResult<Vec<Symbol>> {
    let mut expr = Vec::new();
    let mut stack = vec![root];

    while let Some(ty) = stack.pop() {
        let productions = grammar.productions(ty);
        if productions.is_empty() {
            return Err(GpError::NoProductions(ty));
        }

        let pick = rng.gen_range(0..productions.len());
        let terminals = productions.terminals.len();
        let symbol = if pick < terminals {
            Symbol::Constant(productions.terminals[pick].sample(rng))
        } else {
            let primitive = productions.primitives[pick - terminals];
            stack.extend(primitive.signature().iter().rev());
            Symbol::Primitive(primitive)
        };
        expr.push(symbol);
    }

    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::grammar::{Primitive, Terminal};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_generated_trees_are_well_typed() {
        let grammar = Grammar::chopsticks();
        let mut rng = SmallRng::seed_from_u64(12345);
        for _ in 0..500 {
            let tree = generate_program(&grammar, &mut rng).unwrap();
            assert_eq!(tree.return_type(), SemanticType::Statement);
            tree.check().unwrap();
        }
    }

    #[test]
    fn test_generate_each_type() {
        let grammar = Grammar::chopsticks();
        let mut rng = SmallRng::seed_from_u64(5);
        for ty in SemanticType::ALL {
            let tree = generate(&grammar, ty, &mut rng).unwrap();
            assert_eq!(tree.return_type(), ty);
        }
    }

    #[test]
    fn test_constants_are_leaves() {
        let grammar = Grammar::chopsticks();
        let mut rng = SmallRng::seed_from_u64(8);
        let tree = generate(&grammar, SemanticType::HandValue, &mut rng).unwrap();
        assert_eq!(tree.size(), 1);
        assert!(matches!(tree.symbol(), Symbol::Constant(_)));
    }

    #[test]
    fn test_missing_productions() {
        let mut grammar = Grammar::new(SemanticType::Action);
        grammar.add_primitive(Primitive::Transfer);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            generate(&grammar, SemanticType::Action, &mut rng).unwrap_err(),
            GpError::NoProductions(SemanticType::HandValue)
        );

        grammar.add_terminal(Terminal::HandValue);
        let tree = generate(&grammar, SemanticType::Action, &mut rng).unwrap();
        assert_eq!(tree.size(), 2);
    }

    #[test]
    fn test_prefix_matches_tree() {
        let grammar = Grammar::chopsticks();
        let mut rng = SmallRng::seed_from_u64(21);
        let prefix = generate_prefix(&grammar, SemanticType::Statement, &mut rng).unwrap();
        let tree = TypedNode::from_prefix(&prefix).unwrap();
        assert_eq!(tree.to_prefix(), prefix);
    }
}
