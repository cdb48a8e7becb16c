//! IPD CLI - Command-line interface
//!
//! Commands:
//! - match: Play a single match and print every turn
//! - series: Play repeated matches of one pairing
//! - tournament: Round-robin over a roster and print the scoreboard
//! - strategies: List the built-in strategies

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ipd_engine::{
    run_match, run_series, LogObserver, PairingObserver, PairingReport, SeedSource, SeriesConfig,
    StrategyFactory, StrategyKind, Tournament, TournamentConfig, TurnBounds,
};

#[derive(Parser)]
#[command(name = "ipd")]
#[command(about = "Iterated Prisoner's Dilemma simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Match {
        #[command(flatten)]
        pair: PairArgs,
        #[arg(long, default_value = "100")]
        turns: u32,
        /// Smallest accepted turn count
        #[arg(long, default_value_t = TurnBounds::STANDARD_MIN)]
        min_turns: u32,
        #[arg(long, default_value = "0")]
        seed: u64,
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Play repeated matches of one pairing
    Series {
        #[command(flatten)]
        pair: PairArgs,
        #[arg(long, default_value = "10")]
        samples: u32,
        #[arg(long, default_value = "100")]
        turns: u32,
        /// Smallest accepted turn count
        #[arg(long, default_value_t = TurnBounds::STANDARD_MIN)]
        min_turns: u32,
        #[arg(long, default_value = "0")]
        seed: u64,
        #[arg(long)]
        parallel: bool,
        #[arg(long)]
        json: bool,
    },
    /// Run a round-robin tournament
    Tournament(TournamentArgs),
    /// List built-in strategies
    Strategies,
}

#[derive(Args)]
struct PairArgs {
    /// Strategy on side 0
    #[arg(long)]
    a: StrategyKind,
    /// Strategy on side 1
    #[arg(long)]
    b: StrategyKind,
}

#[derive(Args)]
struct TournamentArgs {
    /// Comma-separated strategy names (default: the five classic strategies)
    #[arg(long, value_delimiter = ',')]
    roster: Vec<StrategyKind>,
    /// JSON TournamentConfig; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long)]
    samples: Option<u32>,
    #[arg(long)]
    turns: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    parallel: bool,
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Match { pair, turns, min_turns, seed, json } => {
            let bounds = TurnBounds::with_min(min_turns)?;
            play_match(pair, turns, &bounds, seed, json)
        }
        Commands::Series { pair, samples, turns, min_turns, seed, parallel, json } => {
            let config = SeriesConfig::new(samples, turns)
                .with_bounds(TurnBounds::with_min(min_turns)?)
                .with_seed(seed)
                .with_parallel(parallel);
            play_series(pair, config, json)
        }
        Commands::Tournament(args) => play_tournament(args),
        Commands::Strategies => {
            for kind in StrategyKind::ALL {
                println!("{:<20} {}", kind.name(), kind.describe());
            }
            Ok(())
        }
    }
}

fn play_match(pair: PairArgs, turns: u32, bounds: &TurnBounds, seed: u64, json: bool) -> Result<()> {
    let seeds = SeedSource::new(seed);
    let result = run_match(pair.a.build(seeds.rng(0)), pair.b.build(seeds.rng(1)), turns, bounds)
    .with_context(|| format!("{} vs. {}", pair.a, pair.b))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for round in &result.rounds {
        println!(
            "{:>4}  {:?} / {:?}  +{} / +{}  ({} / {})",
            round.turn,
            round.first,
            round.second,
            round.payoff_first,
            round.payoff_second,
            round.cumulative_first,
            round.cumulative_second
        );
    }
    println!(
        "{} {} - {} {} : {:?}",
        pair.a, result.total_score_first, result.total_score_second, pair.b, result.outcome
    );
    Ok(())
}

fn play_series(pair: PairArgs, config: SeriesConfig, json: bool) -> Result<()> {
    let result = run_series(&pair.a, &pair.b, config)
        .with_context(|| format!("{} vs. {}", pair.a, pair.b))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let [avg_a, avg_b] = result.avg_points();
    let [coop_a, coop_b] = result.cooperation_rate();
    println!("record (a wins, b wins, ties): {:?}", result.record.as_array());
    println!("total points: {:?}", result.totals);
    println!("average points: {:.2} / {:.2}", avg_a, avg_b);
    println!("cooperation rate: {:.3} / {:.3}", coop_a, coop_b);
    println!("winner: {:?}", result.winner());
    Ok(())
}

fn play_tournament(args: TournamentArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TournamentConfig::default(),
    };
    if let Some(samples) = args.samples {
        config.samples = samples;
    }
    if let Some(turns) = args.turns {
        config.turns = turns;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.parallel {
        config.parallel = true;
    }

    let roster = if args.roster.is_empty() {
        default_roster()
    } else {
        args.roster
    };
    tracing::info!(
        "Tournament: {} strategies, samples={}, turns={}, seed={}",
        roster.len(),
        config.samples,
        config.turns,
        config.seed
    );

    let mut tournament = Tournament::from_kinds(&roster, config).context("invalid tournament")?;
    let mut log_pairing = LogObserver;
    let mut print_pairing = |report: &PairingReport| println!("{}", report);
    // JSON mode keeps stdout clean; progress goes to the log instead
    let observer: &mut dyn PairingObserver = if args.json {
        &mut log_pairing
    } else {
        &mut print_pairing
    };
    let result = tournament
        .run_with_observer(observer)
        .context("tournament failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!();
        for line in result.scoreboard() {
            println!("{}", line);
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<TournamentConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    tracing::debug!("Loaded config: {}", path.display());
    Ok(config)
}

fn default_roster() -> Vec<StrategyKind> {
    vec![
        StrategyKind::RandomChoice,
        StrategyKind::TitForTat,
        StrategyKind::AlwaysCooperate,
        StrategyKind::GrudgeHolder,
        StrategyKind::joss(),
    ]
}
