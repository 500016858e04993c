//! Play command: score one program against a built-in policy.

// Game counts stay far below f64 precision
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use chopsticks_gp::game::DEFAULT_MAX_MOVES;
use chopsticks_gp::gp::{FitnessConfig, OpponentPool, TypedNode, compile, evaluate};
use clap::Args;

use super::{Opponent, rng_from};

/// Arguments of the `play` command.
#[derive(Args, Debug)]
pub(crate) struct PlayArgs {
    /// Program text, e.g. "if_then_else(opp_hand_equal(0, 4), transfer(2), attack(1, 0))"
    #[arg(required = true)]
    program: String,

    /// Opponent policy
    #[arg(short, long, value_enum, default_value = "heuristic")]
    opponent: Opponent,

    /// Number of games to play (default: 1000)
    #[arg(short, long, default_value = "1000")]
    games: usize,

    /// Move cap per game (default: 100)
    #[arg(short, long, default_value_t = DEFAULT_MAX_MOVES)]
    max_moves: u32,

    /// Random seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if the program text does not parse or compile.
pub(crate) fn execute(args: PlayArgs) -> Result<()> {
    let tree: TypedNode = args
        .program
        .parse()
        .with_context(|| format!("cannot parse `{}`", args.program))?;
    let program = compile(&tree)?;
    let pool = OpponentPool::from_policy(args.opponent.into());
    let config = FitnessConfig {
        trials: args.games,
        max_moves: args.max_moves,
    };
    let mut rng = rng_from(args.seed);

    let result = evaluate(&program, &pool, &config, &mut rng)?;

    // normal approximation to the binomial
    let n = result.trials.max(1) as f64;
    let half_width = 1.96 * (result.win_rate * (1.0 - result.win_rate) / n).sqrt();

    println!("Program:  {}", program.text());
    println!("Opponent: {:?}", args.opponent);
    println!("Games:    {}", result.trials);
    println!(
        "Win rate: {:.3} (95% CI {:.3}..{:.3})",
        result.win_rate,
        (result.win_rate - half_width).max(0.0),
        (result.win_rate + half_width).min(1.0)
    );
    println!("Mean normalized length: {:.3}", result.mean_length);
    Ok(())
}
