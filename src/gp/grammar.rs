//! Typed grammar for strategy programs.
//!
//! Every symbol declares the type it returns and, for primitives, the
//! ordered types of its arguments. The [`Grammar`] keeps, per type, two
//! disjoint lists: primitives and terminals. Terminals are ephemeral
//! constant factories whose value is drawn once when a tree is built.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GpError, GpResult};

/// Closed set of types flowing through a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SemanticType {
    /// Program root: a decision that ends in exactly one action.
    Statement,
    /// Boolean test on the current position.
    Condition,
    /// Selects hand 0 or 1.
    HandIndex,
    /// Stick threshold in 0..=4.
    HandValue,
    /// A constructed move.
    Action,
}

impl SemanticType {
    /// Number of types.
    pub const COUNT: usize = 5;

    /// All types, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Statement,
        Self::Condition,
        Self::HandIndex,
        Self::HandValue,
        Self::Action,
    ];

    const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Statement => "Statement",
            Self::Condition => "Condition",
            Self::HandIndex => "HandIndex",
            Self::HandValue => "HandValue",
            Self::Action => "Action",
        };
        f.write_str(name)
    }
}

/// Whose hand a comparison reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The player to move.
    Mine,
    /// The player waiting.
    Theirs,
}

/// Relation tested by a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// Hand holds more sticks than the threshold.
    Greater,
    /// Hand holds exactly the threshold.
    Equal,
    /// Hand holds fewer sticks than the threshold.
    Less,
}

impl Comparison {
    /// Evaluate the relation.
    #[must_use]
    pub const fn holds(self, sticks: u8, threshold: u8) -> bool {
        match self {
            Self::Greater => sticks > threshold,
            Self::Equal => sticks == threshold,
            Self::Less => sticks < threshold,
        }
    }
}

use SemanticType::{Action as A, Condition as C, HandIndex as I, HandValue as V, Statement as S};

const IF1: [SemanticType; 3] = [C, A, A];
const IF2: [SemanticType; 4] = [C, C, A, A];
const IF3: [SemanticType; 5] = [C, C, C, A, A];
const IF4: [SemanticType; 6] = [C, C, C, C, A, A];
const IF1_NESTED: [SemanticType; 3] = [C, A, S];
const IF2_NESTED: [SemanticType; 4] = [C, C, A, S];
const IF3_NESTED: [SemanticType; 5] = [C, C, C, A, S];
const IF4_NESTED: [SemanticType; 6] = [C, C, C, C, A, S];
const COMPARE: [SemanticType; 2] = [I, V];
const ATTACK: [SemanticType; 2] = [I, I];
const TRANSFER: [SemanticType; 1] = [V];

/// A function symbol: has arguments and is expanded during generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    /// If all `conditions` hold take the action, else the second branch.
    ///
    /// The second branch is another action, or a whole statement when
    /// `nested` is set, which chains fallback logic.
    IfThenElse {
        /// Number of conjoined conditions, 1..=4.
        conditions: u8,
        /// Whether the else branch is a statement.
        nested: bool,
    },
    /// Compare one hand of one side against a threshold.
    Compare {
        /// Whose hand.
        side: Side,
        /// Relation to test.
        comparison: Comparison,
    },
    /// Attack from one of my hands onto one of theirs.
    Attack,
    /// Move to `[left, total - left]`, total taken when the move is made.
    Transfer,
}

const IF_SIGNATURES: [&[SemanticType]; 4] = [&IF1, &IF2, &IF3, &IF4];
const IF_NESTED_SIGNATURES: [&[SemanticType]; 4] =
    [&IF1_NESTED, &IF2_NESTED, &IF3_NESTED, &IF4_NESTED];
const IF_NAMES: [&str; 4] = [
    "if_then_else",
    "if2_then_else",
    "if3_then_else",
    "if4_then_else",
];
const IF_NESTED_NAMES: [&str; 4] = [
    "if_then_else_nested",
    "if2_then_else_nested",
    "if3_then_else_nested",
    "if4_then_else_nested",
];

impl Primitive {
    /// Every primitive of the Chopsticks grammar.
    pub const ALL: [Self; 16] = [
        Self::conditional(1, true),
        Self::conditional(2, true),
        Self::conditional(3, true),
        Self::conditional(4, true),
        Self::conditional(1, false),
        Self::conditional(2, false),
        Self::conditional(3, false),
        Self::conditional(4, false),
        Self::compare(Side::Mine, Comparison::Greater),
        Self::compare(Side::Mine, Comparison::Equal),
        Self::compare(Side::Mine, Comparison::Less),
        Self::compare(Side::Theirs, Comparison::Greater),
        Self::compare(Side::Theirs, Comparison::Equal),
        Self::compare(Side::Theirs, Comparison::Less),
        Self::Attack,
        Self::Transfer,
    ];

    /// Conditional over `conditions` conjoined tests.
    #[must_use]
    pub const fn conditional(conditions: u8, nested: bool) -> Self {
        Self::IfThenElse { conditions, nested }
    }

    /// Comparison of one side's hand against a threshold.
    #[must_use]
    pub const fn compare(side: Side, comparison: Comparison) -> Self {
        Self::Compare { side, comparison }
    }

    /// Type this primitive produces.
    #[must_use]
    pub const fn return_type(self) -> SemanticType {
        match self {
            Self::IfThenElse { .. } => S,
            Self::Compare { .. } => C,
            Self::Attack | Self::Transfer => A,
        }
    }

    /// Ordered argument types.
    ///
    /// A conditional with a condition count outside 1..=4 is clamped to
    /// the nearest supported form.
    #[must_use]
    pub const fn signature(self) -> &'static [SemanticType] {
        match self {
            Self::IfThenElse { conditions, nested } => {
                let form = conditional_form(conditions);
                if nested {
                    IF_NESTED_SIGNATURES[form]
                } else {
                    IF_SIGNATURES[form]
                }
            }
            Self::Compare { .. } => &COMPARE,
            Self::Attack => &ATTACK,
            Self::Transfer => &TRANSFER,
        }
    }

    /// Number of arguments.
    #[must_use]
    pub const fn arity(self) -> usize {
        self.signature().len()
    }

    /// Name used in program text.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IfThenElse { conditions, nested } => {
                let form = conditional_form(conditions);
                if nested {
                    IF_NESTED_NAMES[form]
                } else {
                    IF_NAMES[form]
                }
            }
            Self::Compare { side, comparison } => match (side, comparison) {
                (Side::Mine, Comparison::Greater) => "my_hand_greater",
                (Side::Mine, Comparison::Equal) => "my_hand_equal",
                (Side::Mine, Comparison::Less) => "my_hand_less",
                (Side::Theirs, Comparison::Greater) => "opp_hand_greater",
                (Side::Theirs, Comparison::Equal) => "opp_hand_equal",
                (Side::Theirs, Comparison::Less) => "opp_hand_less",
            },
            Self::Attack => "attack",
            Self::Transfer => "transfer",
        }
    }

    /// Look a primitive up by its text name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Table slot for a condition count, clamped to 1..=4.
const fn conditional_form(conditions: u8) -> usize {
    match conditions {
        0 | 1 => 0,
        2 => 1,
        3 => 2,
        _ => 3,
    }
}

/// Ephemeral constant factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terminal {
    /// Draws a hand index uniformly from {0, 1}.
    HandIndex,
    /// Draws a threshold uniformly from {0, .., 4}.
    HandValue,
}

impl Terminal {
    /// Type of the constants this factory produces.
    #[must_use]
    pub const fn return_type(self) -> SemanticType {
        match self {
            Self::HandIndex => I,
            Self::HandValue => V,
        }
    }

    /// Factory producing constants of type `ty`, if that type has one.
    #[must_use]
    pub const fn for_type(ty: SemanticType) -> Option<Self> {
        match ty {
            I => Some(Self::HandIndex),
            V => Some(Self::HandValue),
            _ => None,
        }
    }

    /// Freeze a given value as this factory's constant.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::ConstantOutOfRange`] when `value` exceeds the
    /// type's range.
    pub fn constant(self, value: u8) -> GpResult<Constant> {
        let constant = match self {
            Self::HandIndex => Constant::HandIndex(value),
            Self::HandValue => Constant::HandValue(value),
        };
        constant.validate()?;
        Ok(constant)
    }

    /// Draw a constant.
    pub fn sample<R: Rng>(self, rng: &mut R) -> Constant {
        match self {
            Self::HandIndex => Constant::HandIndex(rng.gen_range(0..=Constant::MAX_HAND_INDEX)),
            Self::HandValue => Constant::HandValue(rng.gen_range(0..=Constant::MAX_HAND_VALUE)),
        }
    }
}

/// A frozen ephemeral value stored in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    /// Hand index, 0 or 1.
    HandIndex(u8),
    /// Stick threshold, 0..=4.
    HandValue(u8),
}

impl Constant {
    /// Largest hand index.
    pub const MAX_HAND_INDEX: u8 = 1;

    /// Largest stick threshold.
    pub const MAX_HAND_VALUE: u8 = 4;

    /// Largest value allowed for this constant's type.
    #[must_use]
    pub const fn max(self) -> u8 {
        match self {
            Self::HandIndex(_) => Self::MAX_HAND_INDEX,
            Self::HandValue(_) => Self::MAX_HAND_VALUE,
        }
    }

    /// Check the value against its type's range.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::ConstantOutOfRange`] for a value above
    /// [`Constant::max`].
    pub fn validate(self) -> GpResult<()> {
        if self.value() > self.max() {
            return Err(GpError::ConstantOutOfRange {
                ty: self.return_type(),
                value: self.value(),
                max: self.max(),
            });
        }
        Ok(())
    }

    /// Type of the constant.
    #[must_use]
    pub const fn return_type(self) -> SemanticType {
        match self {
            Self::HandIndex(_) => I,
            Self::HandValue(_) => V,
        }
    }

    /// The stored value.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::HandIndex(v) | Self::HandValue(v) => v,
        }
    }
}

/// One node label of a program tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// Function symbol with children.
    Primitive(Primitive),
    /// Leaf holding a frozen constant.
    Constant(Constant),
}

impl Symbol {
    /// Type this symbol produces.
    #[must_use]
    pub const fn return_type(self) -> SemanticType {
        match self {
            Self::Primitive(p) => p.return_type(),
            Self::Constant(c) => c.return_type(),
        }
    }

    /// Ordered argument types (empty for constants).
    #[must_use]
    pub const fn signature(self) -> &'static [SemanticType] {
        match self {
            Self::Primitive(p) => p.signature(),
            Self::Constant(_) => &[],
        }
    }

    /// Number of children a node with this symbol must have.
    #[must_use]
    pub const fn arity(self) -> usize {
        self.signature().len()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Constant(c) => write!(f, "{}", c.value()),
        }
    }
}

/// Symbols able to produce one type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Productions {
    /// Function symbols returning the type.
    pub primitives: Vec<Primitive>,
    /// Constant factories returning the type.
    pub terminals: Vec<Terminal>,
}

impl Productions {
    /// Total number of choices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primitives.len() + self.terminals.len()
    }

    /// Whether nothing produces the type.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registry of symbols by return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    root: SemanticType,
    productions: [Productions; SemanticType::COUNT],
}

impl Default for Grammar {
    fn default() -> Self {
        Self::chopsticks()
    }
}

impl Grammar {
    /// Empty grammar rooted at `root`.
    #[must_use]
    pub fn new(root: SemanticType) -> Self {
        Self {
            root,
            productions: Default::default(),
        }
    }

    /// The full Chopsticks grammar: eight conditionals, six comparisons,
    /// two action constructors and two ephemeral constants.
    #[must_use]
    pub fn chopsticks() -> Self {
        let mut grammar = Self::new(SemanticType::Statement);
        for primitive in Primitive::ALL {
            grammar.add_primitive(primitive);
        }
        grammar.add_terminal(Terminal::HandIndex);
        grammar.add_terminal(Terminal::HandValue);
        grammar
    }

    /// Register a primitive under its return type.
    pub fn add_primitive(&mut self, primitive: Primitive) -> &mut Self {
        self.productions[primitive.return_type().slot()]
            .primitives
            .push(primitive);
        self
    }

    /// Register a terminal under its return type.
    pub fn add_terminal(&mut self, terminal: Terminal) -> &mut Self {
        self.productions[terminal.return_type().slot()]
            .terminals
            .push(terminal);
        self
    }

    /// Root type of programs.
    #[must_use]
    pub const fn root(&self) -> SemanticType {
        self.root
    }

    /// Symbols returning `ty`.
    #[must_use]
    pub fn productions(&self, ty: SemanticType) -> &Productions {
        &self.productions[ty.slot()]
    }
}
