use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use lw_cli::commands::{import, leaderboard, log, status, streak, user, workouts};
use lw_cli::{Cli, Commands, Config};

/// Load config and ensure the database's parent directory exists.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::User(action) => user::run(&mut out, action, &config)?,
        Commands::Log(args) => log::run(&mut out, args, &config)?,
        Commands::Workouts(args) => workouts::run(&mut out, args, &config)?,
        Commands::Streak(args) => streak::run(&mut out, args, &config)?,
        Commands::Leaderboard(args) => leaderboard::run(&mut out, args, &config)?,
        Commands::Import(args) => {
            let summary = import::run(&mut out, args, &config)?;
            tracing::debug!(?summary, "import finished");
        }
        Commands::Status => status::run(&mut out, &config)?,
    }

    out.flush()?;
    Ok(())
}
