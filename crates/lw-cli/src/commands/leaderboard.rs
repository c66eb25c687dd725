//! Leaderboard command: users ranked by most recent workout.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;

use lw_core::LeaderboardRow;

use super::util::{format_instant, open_engine};
use crate::Config;

#[derive(Debug, Args)]
pub struct LeaderboardArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &LeaderboardArgs, config: &Config) -> Result<()> {
    run_at(writer, args, config, Utc::now())
}

fn run_at<W: Write>(
    writer: &mut W,
    args: &LeaderboardArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()> {
    let engine = open_engine(config)?;
    let rows = engine.leaderboard(now)?;

    let output = if args.json {
        serde_json::to_string_pretty(&rows)?
    } else {
        format_leaderboard(&rows)
    };
    writeln!(writer, "{output}")?;
    Ok(())
}

/// Format leaderboard rows for human-readable output.
pub fn format_leaderboard(rows: &[LeaderboardRow]) -> String {
    let mut output = String::new();
    if rows.is_empty() {
        let _ = write!(output, "No workouts logged yet.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:>4}  {:<16}  {:<20}  {:>7}  {:>7}",
        "Rank", "User", "Last workout", "Current", "Longest"
    );
    for (idx, row) in rows.iter().enumerate() {
        let name = if row.display_name.chars().count() > 16 {
            format!("{}...", row.display_name.chars().take(13).collect::<String>())
        } else {
            row.display_name.clone()
        };
        let _ = writeln!(
            output,
            "{:>4}  {:<16}  {:<20}  {:>7}  {:>7}",
            idx + 1,
            name,
            format_instant(row.last_workout_at),
            row.current_streak,
            row.longest_streak
        );
    }
    output.truncate(output.trim_end().len());
    output
}
