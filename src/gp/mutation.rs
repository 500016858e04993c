//! Subtree mutation.
//!
//! A node is drawn uniformly from the tree and replaced by a freshly
//! generated subtree of the same type.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GpResult;
use crate::gp::generator::generate;
use crate::gp::grammar::Grammar;
use crate::gp::tree::{TypedNode, limit_height};

/// Configuration for mutation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Mutants taller than this are replaced by their parent.
    pub max_height: usize,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self { max_height: 60 }
    }
}

/// Replace one uniformly drawn subtree of `tree` with a random one.
///
/// # Errors
///
/// Returns an error if the grammar cannot produce the drawn node's type.
pub fn mutate<R: Rng>(
    tree: &TypedNode,
    grammar: &Grammar,
    config: &MutationConfig,
    rng: &mut R,
) -> GpResult<TypedNode> {
    let index = rng.gen_range(0..tree.size());
    let mut mutant = tree.clone();
    let ty = mutant
        .get(index)
        .map_or(tree.return_type(), TypedNode::return_type);
    let fresh = generate(grammar, ty, rng)?;
    mutant.replace(index, fresh)?;
    Ok(limit_height(mutant, tree, config.max_height))
}
