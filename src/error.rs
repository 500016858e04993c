//! Error types for program construction, evaluation and evolution.
//!
//! Illegal game moves have no variant here: the engine resolves them as
//! self-elimination, which is a rule of the game rather than a failure.

use thiserror::Error;

use crate::gp::SemanticType;

/// Contract violations while building, editing or compiling typed trees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GpError {
    /// A symbol was placed in a slot requiring a different type.
    #[error("type mismatch: slot requires {expected}, symbol returns {found}")]
    TypeMismatch {
        /// Type the slot requires.
        expected: SemanticType,
        /// Type the offending symbol returns.
        found: SemanticType,
    },

    /// A node carries the wrong number of children for its symbol.
    #[error("symbol `{symbol}` takes {expected} arguments, found {found}")]
    Arity {
        /// Name of the symbol.
        symbol: String,
        /// Declared arity.
        expected: usize,
        /// Actual child count.
        found: usize,
    },

    /// The grammar offers no symbol returning the required type.
    #[error("grammar has no symbol returning {0}")]
    NoProductions(SemanticType),

    /// A constant holds a value its type does not allow.
    #[error("{ty} constant {value} out of range 0..={max}")]
    ConstantOutOfRange {
        /// Type of the constant.
        ty: SemanticType,
        /// Stored value.
        value: u8,
        /// Largest allowed value.
        max: u8,
    },

    /// A prefix sequence ended before every argument slot was filled.
    #[error("prefix sequence ended with unfilled argument slots")]
    Truncated,

    /// A prefix sequence had symbols left over after the tree was complete.
    #[error("prefix sequence has {0} symbols after the tree is complete")]
    TrailingSymbols(usize),

    /// A preorder index outside the tree was requested.
    #[error("node index {index} out of range for tree of {size} nodes")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of nodes in the tree.
        size: usize,
    },

    /// Program text could not be parsed.
    #[error("parse error at byte {position}: {message}")]
    Parse {
        /// Byte offset of the failure.
        position: usize,
        /// What went wrong.
        message: String,
    },
}

/// Result alias for typed-tree operations.
pub type GpResult<T> = Result<T, GpError>;
