//! Compile typed trees into executable strategies.
//!
//! Each node becomes a closure over the game state. Comparisons read the
//! position at call time. Conditionals test their conditions left to right,
//! stop at the first that fails, and evaluate only the branch they select.
//! Action constructors return an [`Action`] value; nothing in a compiled
//! program mutates the engine, so applying the decision is a single
//! explicit call.

use std::fmt;

use rand::rngs::SmallRng;

use crate::error::{GpError, GpResult};
use crate::game::{Action, GameState, Strategy};
use crate::gp::grammar::{Constant, Primitive, SemanticType, Side, Symbol};
use crate::gp::tree::TypedNode;

type Condition = Box<dyn Fn(&GameState) -> bool + Send + Sync>;
type Decision = Box<dyn Fn(&GameState) -> Action + Send + Sync>;

/// A compiled program: decides one move per call.
pub struct Program {
    decide: Decision,
    text: String,
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program").field("text", &self.text).finish()
    }
}

impl Program {
    /// The move this program makes in `state`.
    #[must_use]
    pub fn decide(&self, state: &GameState) -> Action {
        (self.decide)(state)
    }

    /// Bind the program to an engine as a zero-argument callable.
    ///
    /// Each call makes exactly one move on `engine`.
    pub fn bind<'a>(&'a self, engine: &'a mut GameState) -> impl FnMut() + 'a {
        move || {
            let action = self.decide(engine);
            engine.apply(action);
        }
    }

    /// Source text of the program.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Strategy for Program {
    fn choose(&self, state: &GameState, _rng: &mut SmallRng) -> Action {
        self.decide(state)
    }
}

/// Compile a tree rooted at a statement or an action.
///
/// # Errors
///
/// Returns [`GpError::TypeMismatch`] if the root is neither a statement
/// nor an action, or if any node is ill typed.
pub fn compile(tree: &TypedNode) -> GpResult<Program> {
    tree.check()?;
    let decide = match tree.return_type() {
        SemanticType::Statement | SemanticType::Action => compile_decision(tree)?,
        found => {
            return Err(GpError::TypeMismatch {
                expected: SemanticType::Statement,
                found,
            });
        }
    };
    Ok(Program {
        decide,
        text: tree.to_string(),
    })
}

fn compile_decision(node: &TypedNode) -> GpResult<Decision> {
    let children = node.children();
    match node.symbol() {
        Symbol::Primitive(primitive @ Primitive::IfThenElse { .. }) => {
            let n = primitive.arity() - 2;
            let conditions = children[..n]
                .iter()
                .map(compile_condition)
                .collect::<GpResult<Vec<_>>>()?;
            let then = compile_decision(&children[n])?;
            let otherwise = compile_decision(&children[n + 1])?;
            Ok(Box::new(move |state| {
                if conditions.iter().all(|holds| holds(state)) {
                    then(state)
                } else {
                    otherwise(state)
                }
            }))
        }
        Symbol::Primitive(Primitive::Attack) => {
            let from = constant(&children[0], SemanticType::HandIndex)?;
            let to = constant(&children[1], SemanticType::HandIndex)?;
            Ok(Box::new(move |_| Action::Attack { from, to }))
        }
        Symbol::Primitive(Primitive::Transfer) => {
            let left = constant(&children[0], SemanticType::HandValue)?;
            Ok(Box::new(move |state| {
                let total = state.total(state.current_player());
                // a left share above the total is an illegal split
                let right = total.checked_sub(left).unwrap_or(0);
                Action::Transfer { left, right }
            }))
        }
        other => Err(GpError::TypeMismatch {
            expected: SemanticType::Action,
            found: other.return_type(),
        }),
    }
}

fn compile_condition(node: &TypedNode) -> GpResult<Condition> {
    match node.symbol() {
        Symbol::Primitive(Primitive::Compare { side, comparison }) => {
            let children = node.children();
            let hand = usize::from(constant(&children[0], SemanticType::HandIndex)?);
            let threshold = constant(&children[1], SemanticType::HandValue)?;
            Ok(Box::new(move |state| {
                let seat = match side {
                    Side::Mine => state.current_player(),
                    Side::Theirs => state.opponent(),
                };
                comparison.holds(state.hand(seat)[hand], threshold)
            }))
        }
        other => Err(GpError::TypeMismatch {
            expected: SemanticType::Condition,
            found: other.return_type(),
        }),
    }
}

fn constant(node: &TypedNode, expected: SemanticType) -> GpResult<u8> {
    match node.symbol() {
        Symbol::Constant(c @ (Constant::HandIndex(v) | Constant::HandValue(v)))
            if c.return_type() == expected =>
        {
            Ok(v)
        }
        other => Err(GpError::TypeMismatch {
            expected,
            found: other.return_type(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::generate_program;
    use crate::gp::grammar::Grammar;
    use rand::SeedableRng;

    fn program(text: &str) -> Program {
        compile(&text.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_attack_program() {
        let p = program("attack(1, 0)");
        assert_eq!(
            p.decide(&GameState::new(10)),
            Action::Attack { from: 1, to: 0 }
        );
    }

    #[test]
    fn test_transfer_complement_uses_current_total() {
        let p = program("transfer(1)");
        let state = GameState::from_hands([[0, 3], [1, 1]], 0, 10);
        assert_eq!(p.decide(&state), Action::Transfer { left: 1, right: 2 });
        let state = GameState::from_hands([[0, 4], [1, 1]], 0, 10);
        assert_eq!(p.decide(&state), Action::Transfer { left: 1, right: 3 });
    }

    #[test]
    fn test_transfer_above_total_is_illegal() {
        let p = program("transfer(4)");
        let mut state = GameState::from_hands([[1, 1], [1, 1]], 0, 10);
        (p.bind(&mut state))();
        assert_eq!(state.hand(0), [0, 0]);
    }

    #[test]
    fn test_condition_reads_state_at_call_time() {
        let p = program("if_then_else(opp_hand_greater(0, 1), attack(0, 0), attack(0, 1))");
        let mut state = GameState::new(10);
        assert_eq!(p.decide(&state), Action::Attack { from: 0, to: 1 });
        // seat 0 pushes seat 1's left hand to 2, then seat 1 plays
        state.apply_attack(0, 0);
        state.apply_attack(0, 1);
        assert_eq!(state.current_player(), 0);
        assert_eq!(p.decide(&state), Action::Attack { from: 0, to: 0 });
    }

    #[test]
    fn test_conditions_are_conjoined() {
        let p = program(
            "if2_then_else(my_hand_equal(0, 1), opp_hand_equal(1, 3), transfer(2), attack(1, 1))",
        );
        let state = GameState::from_hands([[1, 1], [1, 3]], 0, 10);
        assert_eq!(p.decide(&state), Action::Transfer { left: 2, right: 0 });
        let state = GameState::from_hands([[1, 1], [1, 2]], 0, 10);
        assert_eq!(p.decide(&state), Action::Attack { from: 1, to: 1 });
    }

    #[test]
    fn test_nested_fallback() {
        let p = program(
            "if_then_else_nested(my_hand_less(0, 0), attack(0, 0), \
             if_then_else(my_hand_equal(1, 1), attack(1, 1), attack(0, 1)))",
        );
        let state = GameState::new(10);
        assert_eq!(p.decide(&state), Action::Attack { from: 1, to: 1 });
    }

    #[test]
    fn test_one_apply_per_call() {
        let grammar = Grammar::chopsticks();
        let mut rng = SmallRng::seed_from_u64(77);
        for _ in 0..200 {
            let tree = generate_program(&grammar, &mut rng).unwrap();
            let p = compile(&tree).unwrap();
            let mut state = GameState::new(100);
            p.play(&mut state, &mut rng);
            assert_eq!(state.applied(), 1, "{}", p.text());
        }
    }

    #[test]
    fn test_rejects_out_of_range_hand_index() {
        let tree: TypedNode = "if_then_else(opp_hand_equal(0, 1), attack(0, 0), attack(0, 1))"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        let tampered: TypedNode =
            serde_json::from_str(&json.replacen(r#"{"HandIndex":0}"#, r#"{"HandIndex":7}"#, 1))
                .unwrap();
        assert!(matches!(
            compile(&tampered).unwrap_err(),
            GpError::ConstantOutOfRange { value: 7, .. }
        ));
    }

    #[test]
    fn test_rejects_non_decision_root() {
        let tree = "my_hand_less(0, 2)".parse().unwrap();
        assert!(matches!(
            compile(&tree).unwrap_err(),
            GpError::TypeMismatch {
                found: SemanticType::Condition,
                ..
            }
        ));
    }
}
