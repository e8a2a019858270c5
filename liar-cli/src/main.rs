//! # liar
//!
//! Runs an LLM liar game described by a YAML file.
//!
//! Usage:
//!   liar run [-c config.yaml] [--seed N] [--json]
//!   liar check -c config.yaml
//!
//! Logs go to stderr (`RUST_LOG` or `--log-level`), optionally also to `--log-file`.

mod backend;
mod config;

use backend::Backend;
use clap::{Parser, Subcommand};
use config::FileConfig;
use liar_error::{Error, ErrorKind, Result};
use liar_game::{Game, GameReport, RoundPolicy, RoundRecord};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "liar")]
#[command(author, version, about = "Liar Game played by language models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, e.g. "info" or "liar_game=debug" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write plain-text logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game
    Run {
        /// Game file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Seed for liar choice, turn order and genre (overrides the file)
        #[arg(long)]
        seed: Option<u64>,

        /// Print the final report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Validate a game file without calling any model
    Check {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
}

fn init_tracing(level: Option<&str>, log_file: Option<&Path>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| {
            Error::invalid_argument(format!("bad log filter '{}': {}", level, e))
                .with_operation("main::init_tracing")
        })?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                Error::from(e)
                    .with_operation("main::init_tracing")
                    .with_context("path", path.display().to_string())
            })?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn print_round(record: &RoundRecord) {
    println!("\n=== Round {} ===", record.number());
    println!(
        "Topics: '{}' (liar: '{}')",
        record.main_topic(),
        record.liar_topic()
    );
    println!("Liar: {}", record.liar());
    println!("Words:");
    for (player, word) in record.words() {
        println!("  {}: {}", player, word);
    }
    println!("Votes:");
    for (voter, target) in record.votes() {
        println!("  {} -> {}", voter, target);
    }
    println!("Most voted: {}", record.most_voted());
    if record.group_won() {
        println!("The group caught the liar. {} is out.", record.eliminated());
    } else {
        println!("The liar escaped. {} is out.", record.eliminated());
    }
    if let Some(analysis) = record.analysis() {
        println!("Judge: {}", analysis);
    }
}

fn print_standings(report: &GameReport) {
    println!("\n=== Game complete ===");
    println!("Total rounds: {}", report.rounds.len());
    println!("Group wins: {}", report.group_wins);
    println!("Liar wins: {}", report.liar_wins);
    println!("Winners: {}", report.winners.join(", "));
    println!("Eliminated (most recent first): {}", report.losers.join(", "));
}

fn describe(policy: &RoundPolicy) -> String {
    match policy {
        RoundPolicy::Fixed { rounds } => format!("{} fixed rounds", rounds),
        RoundPolicy::Elimination { min_players } => {
            format!("elimination down to {} players", min_players)
        }
    }
}

async fn run(config_path: &Path, seed: Option<u64>, json: bool) -> Result<()> {
    let (mut game_config, provider) = FileConfig::load(config_path)?.into_parts()?;
    if let Some(seed) = seed {
        game_config.seed = Some(seed);
    }
    info!(
        config = %config_path.display(),
        provider = ?provider.kind,
        players = game_config.players.len(),
        policy = %describe(&game_config.policy),
        "starting liar game"
    );

    let backend = Backend::connect(&provider)?;
    let mut game = Game::new(game_config, backend)?;

    while !game.is_finished() {
        let record = game.play_round().await?;
        if !json {
            print_round(record);
        }
    }

    let report = game.into_report();
    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| {
            Error::new(ErrorKind::SerializationFailed, e.to_string())
                .with_operation("main::run")
                .set_source(e)
        })?;
        println!("{}", out);
    } else {
        print_standings(&report);
    }

    info!(
        rounds = report.rounds.len(),
        group_wins = report.group_wins,
        liar_wins = report.liar_wins,
        "game complete"
    );
    Ok(())
}

fn check(config_path: &Path) -> Result<()> {
    let (game_config, provider) = FileConfig::load(config_path)?.into_parts()?;
    provider.provider_config()?;

    println!("{} is valid", config_path.display());
    println!(
        "  players: {}",
        game_config
            .players
            .iter()
            .map(|p| format!("{} ({})", p.name, p.model_id))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  judge: {}", game_config.judge_model_id);
    println!("  policy: {}", describe(&game_config.policy));
    println!("  provider: {:?}", provider.kind);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_level.as_deref(), cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Run { config, seed, json } => run(&config, seed, json).await,
        Commands::Check { config } => check(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "liar game failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
