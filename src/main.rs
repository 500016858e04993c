//! chopsticks-gp CLI - evolve Chopsticks strategies and pit them against
//! the built-in policies.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use env_logger::Env;
use std::process::ExitCode;

/// Typed genetic programming for Chopsticks
#[derive(Parser, Debug)]
#[command(name = "chopsticks-gp")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Co-evolve strategies and save the hall of fame
    Evolve(cli::evolve::EvolveArgs),

    /// Evaluate a program against a built-in policy
    Play(cli::play::PlayArgs),
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let result = match args.command {
        Commands::Evolve(args) => cli::evolve::execute(args),
        Commands::Play(args) => cli::play::execute(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
