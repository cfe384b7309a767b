mod config;
mod replay;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use config::{ConfigError, DEFAULT_GRID_SPACING, GridConfig, SPACING_X_ENV, SPACING_Y_ENV};
use replay::{ReplayError, Session};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

#[derive(Parser, Debug)]
#[command(name = "gridwire", about = "Replay and check orthogonal wiring sessions")]
struct Cli {
    /// Grid cell width in world units.
    #[arg(long, env = SPACING_X_ENV, default_value_t = DEFAULT_GRID_SPACING)]
    spacing_x: f64,

    /// Grid cell height in world units.
    #[arg(long, env = SPACING_Y_ENV, default_value_t = DEFAULT_GRID_SPACING)]
    spacing_y: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a recorded session through the editor and print the resulting graph.
    Replay {
        session: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Load a snapshot and print wire, junction and net counts.
    Check {
        snapshot: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = GridConfig::new(cli.spacing_x, cli.spacing_y)?;

    match cli.command {
        Command::Replay { session, pretty } => run_replay(&config, &session, pretty),
        Command::Check { snapshot, pretty } => run_check(&snapshot, pretty),
    }
}

fn run_replay(config: &GridConfig, path: &Path, pretty: bool) -> Result<(), CliError> {
    let session: Session = replay::read_json(path)?;
    tracing::info!(path = %path.display(), events = session.events.len(), "replaying session");
    let outcome = replay::replay(session, config.grid())?;
    println!("{}", replay::to_json(&outcome, pretty)?);
    Ok(())
}

fn run_check(path: &Path, pretty: bool) -> Result<(), CliError> {
    let report = replay::check(replay::read_json(path)?)?;
    tracing::info!(path = %path.display(), wires = report.wires, junctions = report.junctions, "snapshot ok");
    println!("{}", replay::to_json(&report, pretty)?);
    Ok(())
}
