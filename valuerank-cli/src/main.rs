mod config;
mod output;
mod prompt;
mod simulate;
mod state;

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use valuerank_core::{EngineConfig, Presentation, RankingEngine, DEFAULT_CATALOGUE};

use crate::config::ValuerankConfig;
use crate::prompt::Answer;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "valuerank", version, about = "Rank your personal values one pairwise choice at a time")]
struct Cli {
    /// Path to config file (default: ~/.config/valuerank/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session file (default: ~/.local/share/valuerank/session.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Items to rank when starting fresh: JSON array or one name per line
    #[arg(long, global = true)]
    catalogue: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Answer comparisons until you quit; progress is saved after every choice
    Rank,
    /// Compare two specific values
    Compare {
        left: String,
        right: String,
    },
    /// Show the current ranking
    Results {
        /// Output JSON instead of table
        #[arg(long)]
        json: bool,
    },
    /// Show the choices that took longest to make
    Conflicts {
        #[arg(long)]
        json: bool,
    },
    /// Pin values to the top of the ranking in the given order
    Order {
        names: Vec<String>,
        /// Remove every pinned position instead
        #[arg(long, conflicts_with = "names")]
        clear: bool,
    },
    /// Forget every decision and start over
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Measure ranking accuracy against simulated users
    Simulate(simulate::SimulateArgs),
    /// Create a default config file at ~/.config/valuerank/config.toml
    Init,
}

/// Resolved settings for commands that touch the saved session.
struct Context {
    state_path: PathBuf,
    catalogue: Vec<String>,
    engine: EngineConfig,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);

    match cli.command {
        Commands::Init => {
            config::create_default_config(&config_path);
            println!("Created config at {}", config_path.display());
            println!("Edit it to pick a catalogue or tune the engine.");
        }
        ref command => {
            let ctx = resolve_context(&cli, config::load_config(&config_path));
            run_command(command, &ctx);
        }
    }
}

fn run_command(command: &Commands, ctx: &Context) {
    match command {
        Commands::Rank => run_rank(ctx),
        Commands::Compare { left, right } => run_compare(ctx, left, right),
        Commands::Results { json } => {
            let engine = open_session(ctx);
            let rankings = engine.rankings();
            if *json {
                output::print_json(&rankings, engine.decisions().len(), &engine.progress());
            } else {
                output::print_table(&rankings, engine.decisions().len(), &engine.progress());
            }
        }
        Commands::Conflicts { json } => {
            let engine = open_session(ctx);
            if *json {
                output::print_conflicts_json(engine.conflicts());
            } else {
                output::print_conflicts(engine.conflicts());
            }
        }
        Commands::Order { names, clear } => run_order(ctx, names, *clear),
        Commands::Reset { yes } => run_reset(ctx, *yes),
        Commands::Simulate(args) => simulate::run(args, ctx.engine.clone()),
        Commands::Init => {}
    }
}

/// Merge config file with CLI args (CLI wins).
fn resolve_context(cli: &Cli, cfg: ValuerankConfig) -> Context {
    let state_path = cli
        .state
        .clone()
        .or_else(|| cfg.state_path.map(PathBuf::from))
        .unwrap_or_else(config::default_state_path);

    let catalogue = match cli.catalogue.clone().or_else(|| cfg.catalogue.map(PathBuf::from)) {
        Some(path) => state::load_catalogue(&path),
        None => DEFAULT_CATALOGUE.iter().map(|s| s.to_string()).collect(),
    };

    Context { state_path, catalogue, engine: cfg.engine.unwrap_or_default() }
}

/// Resume the saved session, or start a fresh one if there is none or it is unreadable.
fn open_session(ctx: &Context) -> RankingEngine {
    let saved = state::load_state(&ctx.state_path);
    let resumed = RankingEngine::resume(&ctx.catalogue, saved.as_deref(), ctx.engine.clone())
        .unwrap_or_else(|e| bail(format!("Cannot start a session: {e}")));
    if let Some(err) = resumed.recovered {
        eprintln!(
            "Warning: saved session at {} could not be used ({err}); starting fresh.",
            ctx.state_path.display()
        );
    }
    resumed.engine
}

fn run_rank(ctx: &Context) {
    let mut engine = open_session(ctx);
    println!(
        "{} values, {} decisions so far. Type 1 or 2 to choose, q to stop.",
        engine.num_items(),
        engine.decisions().len(),
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let answered = prompt::run_interactive(&mut engine, &mut input, &mut out, |e| save(ctx, e))
        .unwrap_or_else(|e| bail(format!("Terminal error: {e}")));

    let progress = engine.progress();
    println!("\n{answered} decisions this session. {}% accurate. {}", progress.whole_percent, progress.message);
}

fn run_compare(ctx: &Context, left: &str, right: &str) {
    let mut engine = open_session(ctx);
    let presentation = engine.present(left, right).unwrap_or_else(|e| bail(e));
    let mut out = io::stdout();

    let committed = match presentation {
        Presentation::Decided { decision, .. } => {
            println!("  Already decided: {} over {}", decision.winner, decision.loser);
            false
        }
        Presentation::AutoResolved { .. } => {
            prompt::print_events(&engine.drain_events(), &mut out)
                .unwrap_or_else(|e| bail(format!("Terminal error: {e}")));
            true
        }
        Presentation::Choose(pair) => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let answered = prompt::print_events(&engine.drain_events(), &mut out)
                .and_then(|_| prompt::answer_pair(&mut engine, pair.id, &mut input, &mut out))
                .unwrap_or_else(|e| bail(format!("Terminal error: {e}")));
            answered == Answer::Committed
        }
    };

    if committed {
        save(ctx, &engine);
    }
}

fn run_order(ctx: &Context, names: &[String], clear: bool) {
    let mut engine = open_session(ctx);
    if clear {
        engine.clear_manual_order();
        println!("Pinned positions cleared.");
    } else {
        if names.is_empty() {
            bail("Give the values to pin, in order, or pass --clear.");
        }
        engine.apply_manual_order(names).unwrap_or_else(|e| bail(e));
        println!("Pinned {} values to the top.", names.len());
    }
    save(ctx, &engine);
}

fn run_reset(ctx: &Context, yes: bool) {
    if !yes {
        let stdin = io::stdin();
        let mut out = io::stdout();
        let sure = prompt::confirm("Start over completely? Every decision will be lost.", &mut stdin.lock(), &mut out)
            .unwrap_or_else(|e| bail(format!("Terminal error: {e}")));
        if !sure {
            println!("Nothing changed.");
            return;
        }
    }

    let mut engine = open_session(ctx);
    engine.request_reset();
    let mut out = io::stdout();
    prompt::print_events(&engine.drain_events(), &mut out)
        .and_then(|_| out.flush())
        .unwrap_or_else(|e| bail(format!("Terminal error: {e}")));
    save(ctx, &engine);
}

fn save(ctx: &Context, engine: &RankingEngine) {
    let json = engine.to_json().unwrap_or_else(|e| bail(format!("Failed to serialize session: {e}")));
    state::save_or_bail(&ctx.state_path, &json);
}
