//! CLI command for genetic programming evolution.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chopsticks_gp::gp::{Evolution, EvolutionConfig, EvolutionResult, save_hall_of_fame};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

/// Arguments of the `evolve` command.
#[derive(Args, Debug)]
pub(crate) struct EvolveArgs {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Population size (default: 800)
    #[arg(short, long)]
    population: Option<usize>,

    /// Generations per co-evolution block (default: 10)
    #[arg(short, long)]
    generations_per_block: Option<usize>,

    /// Number of co-evolution blocks (default: 5)
    #[arg(short, long)]
    blocks: Option<usize>,

    /// Games per fitness evaluation (default: 25)
    #[arg(short, long)]
    trials: Option<usize>,

    /// Random seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where to write the hall of fame
    #[arg(short, long, default_value = "hall_of_fame.json")]
    output: PathBuf,

    /// Suppress the progress bar and summary
    #[arg(short, long)]
    quiet: bool,
}

impl EvolveArgs {
    fn to_config(&self) -> Result<EvolutionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("invalid configuration in {}", path.display()))?
            }
            None => EvolutionConfig::default(),
        };

        if let Some(n) = self.population {
            config.population_size = n;
        }
        if let Some(g) = self.generations_per_block {
            config.generations_per_block = g;
        }
        if let Some(b) = self.blocks {
            config.blocks = b;
        }
        if let Some(t) = self.trials {
            config.trials = t;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

/// Execute the evolve command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, evolution fails, or
/// the hall of fame cannot be written.
pub(crate) fn execute(args: EvolveArgs) -> Result<()> {
    let config = args.to_config()?;
    let total = config.total_generations();
    let evolution = Evolution::new(config).context("cannot start evolution")?;

    let result = if args.quiet {
        evolution.run()?
    } else {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} generations {msg}",
            )?
            .progress_chars("=>-"),
        );
        let result = evolution.run_with(|stats| {
            pb.set_message(format!(
                "block {} best {:.3} mean {:.3}",
                stats.block, stats.fitness.max, stats.fitness.mean
            ));
            pb.inc(1);
        })?;
        pb.finish_with_message("done");
        result
    };

    save_hall_of_fame(&result.hall_of_fame, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    if !args.quiet {
        print_results(&args.output, &result);
    }
    Ok(())
}

fn print_results(output: &std::path::Path, result: &EvolutionResult) {
    println!();
    println!("Evolution complete!");
    if let Some(last) = result.history.last() {
        println!(
            "  Final generation: min={:.3} mean={:.3} median={:.3} max={:.3} std={:.3}",
            last.fitness.min,
            last.fitness.mean,
            last.fitness.median,
            last.fitness.max,
            last.fitness.std
        );
    }
    println!("  Hall of fame ({} members):", result.hall_of_fame.len());
    for (rank, member) in result.hall_of_fame.members().iter().enumerate() {
        println!(
            "    {:>2}. {:.3}  {}",
            rank + 1,
            member.fitness_or_zero(),
            member.tree
        );
    }
    println!();
    println!("Saved to {}", output.display());
}
