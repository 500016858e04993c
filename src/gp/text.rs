//! Parse program text back into trees.
//!
//! The text form is what [`TypedNode`]'s `Display` prints: primitives as
//! `name(arg, ...)`, constants as bare integers. An integer's type comes
//! from the argument slot it fills.

use std::str::FromStr;

use crate::error::{GpError, GpResult};
use crate::gp::grammar::{Primitive, SemanticType, Symbol, Terminal};
use crate::gp::tree::TypedNode;

/// Deepest primitive nesting the parser accepts.
pub const MAX_NESTING: usize = 256;

impl FromStr for TypedNode {
    type Err = GpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            input: s,
            pos: 0,
            depth: 0,
        };
        let tree = parser.node(None)?;
        parser.skip_ws();
        if parser.pos < s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(tree)
    }
}

/// Parse program text, requiring a particular root type.
///
/// # Errors
///
/// Returns [`GpError::Parse`] for malformed text or nesting deeper than
/// [`MAX_NESTING`], and [`GpError::TypeMismatch`] when the root has the
/// wrong type.
pub fn parse_program(text: &str, root: SemanticType) -> GpResult<TypedNode> {
    let tree: TypedNode = text.parse()?;
    if tree.return_type() != root {
        return Err(GpError::TypeMismatch {
            expected: root,
            found: tree.return_type(),
        });
    }
    Ok(tree)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> GpError {
        GpError::Parse {
            position: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> GpResult<()> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(format!("expected `{c}`")))
        }
    }

    fn word(&mut self) -> &str {
        let start = self.pos;
        let len = self.input[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.input.len() - start);
        self.pos += len;
        &self.input[start..start + len]
    }

    fn node(&mut self, slot: Option<SemanticType>) -> GpResult<TypedNode> {
        self.skip_ws();
        let start = self.pos;
        let word = self.word().to_owned();
        if word.is_empty() {
            return Err(self.error("expected a symbol"));
        }

        if word.bytes().all(|b| b.is_ascii_digit()) {
            return Self::constant(&word, slot, start);
        }

        let primitive = Primitive::from_name(&word).ok_or_else(|| GpError::Parse {
            position: start,
            message: format!("unknown primitive `{word}`"),
        })?;
        if let Some(expected) = slot.filter(|&ty| ty != primitive.return_type()) {
            return Err(GpError::TypeMismatch {
                expected,
                found: primitive.return_type(),
            });
        }

        if self.depth >= MAX_NESTING {
            return Err(GpError::Parse {
                position: start,
                message: format!("nesting deeper than {MAX_NESTING}"),
            });
        }
        self.expect('(')?;
        self.depth += 1;
        let mut children = Vec::with_capacity(primitive.arity());
        for (i, &arg) in primitive.signature().iter().enumerate() {
            if i > 0 {
                self.expect(',')?;
            }
            children.push(self.node(Some(arg))?);
        }
        self.expect(')')?;
        self.depth -= 1;

        TypedNode::new(Symbol::Primitive(primitive), children)
    }

    fn constant(digits: &str, slot: Option<SemanticType>, start: usize) -> GpResult<TypedNode> {
        let at = |message: String| GpError::Parse {
            position: start,
            message,
        };
        let slot = slot.ok_or_else(|| at("a bare constant has no type".to_owned()))?;
        let terminal = Terminal::for_type(slot)
            .ok_or_else(|| at(format!("constant in a {slot} slot")))?;
        let value: u8 = digits
            .parse()
            .map_err(|_| at(format!("constant `{digits}` out of range")))?;
        let constant = terminal.constant(value).map_err(|e| at(e.to_string()))?;
        Ok(TypedNode::constant(constant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::generate;
    use crate::gp::grammar::Grammar;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_parse_simple_program() {
        let text = "if_then_else(opp_hand_equal(0, 4), transfer(2), attack(1, 0))";
        let tree: TypedNode = text.parse().unwrap();
        assert_eq!(tree.return_type(), SemanticType::Statement);
        assert_eq!(tree.size(), 9);
        assert_eq!(tree.to_string(), text);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let tree: TypedNode = "  attack( 1 ,0 ) ".parse().unwrap();
        assert_eq!(tree.to_string(), "attack(1, 0)");
    }

    #[test]
    fn test_text_round_trip_of_generated_trees() {
        let grammar = Grammar::chopsticks();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..100 {
            let tree = generate(&grammar, SemanticType::Statement, &mut rng).unwrap();
            let parsed: TypedNode = tree.to_string().parse().unwrap();
            assert_eq!(parsed, tree);
        }
    }

    #[test]
    fn test_parse_rejects_ill_typed_slot() {
        let err = "attack(transfer(1), 0)".parse::<TypedNode>().unwrap_err();
        assert!(matches!(err, GpError::TypeMismatch { .. }));
    }

    #[test]
    fn test_parse_rejects_out_of_range_constant() {
        assert!("attack(2, 0)".parse::<TypedNode>().is_err());
        assert!("transfer(5)".parse::<TypedNode>().is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<TypedNode>().is_err());
        assert!("attack(0, 1".parse::<TypedNode>().is_err());
        assert!("attack(0, 1) extra".parse::<TypedNode>().is_err());
        assert!("launch(0)".parse::<TypedNode>().is_err());
        assert!("3".parse::<TypedNode>().is_err());
    }

    #[test]
    fn test_parse_constant_in_primitive_slot() {
        let err = "if_then_else(1, attack(0, 0), attack(0, 1))"
            .parse::<TypedNode>()
            .unwrap_err();
        match err {
            GpError::Parse { position, message } => {
                assert_eq!(position, 13);
                assert_eq!(message, "constant in a Condition slot");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    fn nested_text(levels: usize) -> String {
        let mut text = "if_then_else_nested(my_hand_less(0, 0), attack(0, 0), ".repeat(levels);
        text.push_str("attack(0, 1)");
        text.push_str(&")".repeat(levels));
        text
    }

    #[test]
    fn test_parse_accepts_moderate_nesting() {
        let tree: TypedNode = nested_text(100).parse().unwrap();
        assert_eq!(tree.height(), 101);
    }

    #[test]
    fn test_parse_rejects_excessive_nesting() {
        let err = nested_text(5_000).parse::<TypedNode>().unwrap_err();
        assert!(
            matches!(&err, GpError::Parse { message, .. } if message.contains("nesting")),
            "{err:?}"
        );
        assert!(nested_text(MAX_NESTING + 1).parse::<TypedNode>().is_err());
    }

    #[test]
    fn test_parse_program_checks_root() {
        assert!(parse_program("attack(0, 1)", SemanticType::Statement).is_err());
        assert!(parse_program("attack(0, 1)", SemanticType::Action).is_ok());
    }
}
