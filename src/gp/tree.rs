//! Typed program trees.
//!
//! A [`TypedNode`] owns its children. Every constructor and editing
//! operation checks that each child's return type matches the slot its
//! parent declares, so a tree that exists is well typed.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{GpError, GpResult};
use crate::gp::grammar::{Constant, Primitive, SemanticType, Symbol};

/// One node of a program tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedNode {
    symbol: Symbol,
    children: Vec<TypedNode>,
}

impl TypedNode {
    /// Build a node, checking arity, child types and constant ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Arity`] or [`GpError::TypeMismatch`] when the
    /// children do not fit the symbol's signature, and
    /// [`GpError::ConstantOutOfRange`] for an out-of-range constant leaf.
    pub fn new(symbol: Symbol, children: Vec<TypedNode>) -> GpResult<Self> {
        if let Symbol::Constant(constant) = symbol {
            constant.validate()?;
        }
        let signature = symbol.signature();
        if signature.len() != children.len() {
            return Err(GpError::Arity {
                symbol: symbol.to_string(),
                expected: signature.len(),
                found: children.len(),
            });
        }
        for (&expected, child) in signature.iter().zip(&children) {
            let found = child.return_type();
            if expected != found {
                return Err(GpError::TypeMismatch { expected, found });
            }
            if let Symbol::Constant(constant) = child.symbol {
                constant.validate()?;
            }
        }
        Ok(Self { symbol, children })
    }

    /// Leaf holding a constant.
    ///
    /// The value is not range checked here; [`TypedNode::check`] rejects
    /// out-of-range constants before a tree is compiled.
    #[must_use]
    pub const fn constant(constant: Constant) -> Self {
        Self {
            symbol: Symbol::Constant(constant),
            children: Vec::new(),
        }
    }

    /// Build a primitive node.
    ///
    /// # Errors
    ///
    /// See [`TypedNode::new`].
    pub fn primitive(primitive: Primitive, children: Vec<TypedNode>) -> GpResult<Self> {
        Self::new(Symbol::Primitive(primitive), children)
    }

    /// Reassemble a tree from its preorder symbol sequence.
    ///
    /// Arity is known per symbol, so the flat order is unambiguous.
    ///
    /// # Errors
    ///
    /// Fails if the sequence is too short, too long, or ill typed.
    pub fn from_prefix(symbols: &[Symbol]) -> GpResult<Self> {
        let mut cursor = symbols.iter();
        let tree = Self::take_prefix(&mut cursor)?;
        match cursor.len() {
            0 => Ok(tree),
            rest => Err(GpError::TrailingSymbols(rest)),
        }
    }

    fn take_prefix(cursor: &mut std::slice::Iter<'_, Symbol>) -> GpResult<Self> {
        let &symbol = cursor.next().ok_or(GpError::Truncated)?;
        let children = (0..symbol.arity())
            .map(|_| Self::take_prefix(cursor))
            .collect::<GpResult<Vec<_>>>()?;
        Self::new(symbol, children)
    }

    /// Preorder symbol sequence.
    #[must_use]
    pub fn to_prefix(&self) -> Vec<Symbol> {
        self.preorder().map(|node| node.symbol).collect()
    }

    /// Symbol at this node.
    #[must_use]
    pub const fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Children in argument order.
    #[must_use]
    pub fn children(&self) -> &[TypedNode] {
        &self.children
    }

    /// Type this subtree produces.
    #[must_use]
    pub const fn return_type(&self) -> SemanticType {
        self.symbol.return_type()
    }

    /// Number of nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }

    /// Longest root-to-leaf path in edges; a lone leaf has height 0.
    #[must_use]
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Nodes in preorder.
    pub fn preorder(&self) -> impl Iterator<Item = &TypedNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Node at a preorder index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TypedNode> {
        self.preorder().nth(index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut TypedNode> {
        if index == 0 {
            return Some(self);
        }
        let mut offset = 1;
        for child in &mut self.children {
            let size = child.size();
            if index < offset + size {
                return child.get_mut(index - offset);
            }
            offset += size;
        }
        None
    }

    /// Swap in `donor` at a preorder index and return the subtree it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::IndexOutOfRange`] for a missing node and
    /// [`GpError::TypeMismatch`] when the donor's type differs from the
    /// replaced subtree's; the tree is left untouched in both cases.
    pub fn replace(&mut self, index: usize, donor: TypedNode) -> GpResult<TypedNode> {
        let size = self.size();
        let slot = self
            .get_mut(index)
            .ok_or(GpError::IndexOutOfRange { index, size })?;
        if slot.return_type() != donor.return_type() {
            return Err(GpError::TypeMismatch {
                expected: slot.return_type(),
                found: donor.return_type(),
            });
        }
        Ok(std::mem::replace(slot, donor))
    }

    /// Verify every node's children against its signature and every
    /// constant against its range.
    ///
    /// This guards trees that arrive through deserialization or through
    /// [`TypedNode::constant`].
    ///
    /// # Errors
    ///
    /// Returns the first arity, type or range violation found.
    pub fn check(&self) -> GpResult<()> {
        for node in self.preorder() {
            if let Symbol::Constant(constant) = node.symbol {
                constant.validate()?;
            }
            let signature = node.symbol.signature();
            if signature.len() != node.children.len() {
                return Err(GpError::Arity {
                    symbol: node.symbol.to_string(),
                    expected: signature.len(),
                    found: node.children.len(),
                });
            }
            for (&expected, child) in signature.iter().zip(&node.children) {
                if child.return_type() != expected {
                    return Err(GpError::TypeMismatch {
                        expected,
                        found: child.return_type(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for TypedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)?;
        if let Symbol::Primitive(_) = self.symbol {
            f.write_str("(")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Bloat control: keep `offspring` only if it fits within `max_height`,
/// otherwise fall back to a copy of `parent`.
#[must_use]
pub fn limit_height(offspring: TypedNode, parent: &TypedNode, max_height: usize) -> TypedNode {
    let height = offspring.height();
    if height > max_height {
        debug!("offspring height {height} exceeds {max_height}, keeping parent");
        parent.clone()
    } else {
        offspring
    }
}
