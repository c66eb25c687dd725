//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::import::ImportArgs;
use crate::commands::leaderboard::LeaderboardArgs;
use crate::commands::log::LogArgs;
use crate::commands::streak::StreakArgs;
use crate::commands::user::UserAction;
use crate::commands::workouts::WorkoutsArgs;

/// Workout streak tracker.
///
/// Logs at most one workout per day per user and tracks how many consecutive
/// weeks each user has met their weekly goal.
#[derive(Debug, Parser)]
#[command(name = "lw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register, inspect and remove users.
    #[command(subcommand)]
    User(UserAction),

    /// Log a workout for a user.
    Log(LogArgs),

    /// List a user's workouts, newest first.
    Workouts(WorkoutsArgs),

    /// Show a user's current streak, longest streak and weekly progress.
    Streak(StreakArgs),

    /// Rank users by their most recent workout.
    Leaderboard(LeaderboardArgs),

    /// Import workouts from JSONL on stdin.
    Import(ImportArgs),

    /// Show database and timezone status.
    Status,
}
