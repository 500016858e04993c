#![no_main]

//! Program text fuzzer.
//!
//! Arbitrary text must either fail to parse with an error or produce a
//! well-typed tree whose printed form parses back to the same tree.

use chopsticks_gp::game::GameState;
use chopsticks_gp::gp::{TypedNode, compile};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let Ok(tree) = text.parse::<TypedNode>() else {
        return;
    };
    tree.check().unwrap();

    let printed = tree.to_string();
    let reparsed: TypedNode = printed.parse().unwrap();
    assert_eq!(reparsed, tree);

    if let Ok(program) = compile(&tree) {
        let mut state = GameState::new(10);
        (program.bind(&mut state))();
        assert_eq!(state.applied(), 1);
    }
});
