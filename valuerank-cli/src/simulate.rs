/// Simulate command: compares the rating engine with the old points tally
/// on simulated users whose true order is known.
use clap::Parser;
use std::time::Instant;
use valuerank_core::{simulate, EngineConfig, SimulationConfig, DEFAULT_CATALOGUE};

use crate::bail;
use crate::output;

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Number of items per simulated user (default: size of the built-in catalogue)
    #[arg(long)]
    items: Option<usize>,

    /// Decision budgets to evaluate, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [120, 150, 200, 300, 500])]
    matches: Vec<usize>,

    /// Simulated users per budget
    #[arg(long, default_value_t = 200)]
    trials: usize,

    /// RNG seed for reproducible runs (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Output JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn simulation_config(args: &SimulateArgs, engine: EngineConfig) -> SimulationConfig {
    let num_items = args.items.unwrap_or(DEFAULT_CATALOGUE.len());
    if num_items < 2 {
        bail(format!("Need at least 2 items to simulate, got {num_items}"));
    }
    if args.trials == 0 {
        bail("--trials must be at least 1");
    }
    if args.matches.is_empty() {
        bail("--matches needs at least one budget");
    }

    SimulationConfig {
        num_items,
        match_counts: args.matches.clone(),
        trials: args.trials,
        seed: args.seed.unwrap_or_else(rand::random),
        engine,
    }
}

pub fn run(args: &SimulateArgs, engine: EngineConfig) {
    let config = simulation_config(args, engine);
    eprintln!(
        "Simulating {} users x {} budgets over {} items (seed {})",
        config.trials,
        config.match_counts.len(),
        config.num_items,
        config.seed,
    );

    let started = Instant::now();
    let reports = simulate(&config).unwrap_or_else(|e| bail(format!("Simulation failed: {e}")));
    eprintln!("Done in {:.1}s", started.elapsed().as_secs_f64());

    if args.json {
        output::print_simulation_json(&reports);
    } else {
        output::print_simulation(&reports, config.num_items, config.trials);
    }
}
