//! Workouts command for listing a user's workout history.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use clap::Args;

use lw_core::{Workout, WorkoutStore};

use super::util::{format_instant, open_engine, resolve_user};
use crate::Config;

#[derive(Debug, Args)]
pub struct WorkoutsArgs {
    /// User ID or username.
    pub user: String,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &WorkoutsArgs, config: &Config) -> Result<()> {
    let engine = open_engine(config)?;
    let db = engine.store();
    let profile = resolve_user(db, &args.user)?;

    let mut workouts = db.workouts_for_user(&profile.id)?;
    workouts.reverse();

    let output = if args.json {
        serde_json::to_string_pretty(&workouts)?
    } else {
        format_workouts(&profile.username, &workouts)
    };
    writeln!(writer, "{output}")?;
    Ok(())
}

/// Format a user's workouts, newest first, for human-readable output.
pub fn format_workouts(username: &str, workouts: &[Workout]) -> String {
    let mut output = String::new();
    if workouts.is_empty() {
        let _ = write!(output, "No workouts logged for {username}.");
        return output;
    }

    let _ = writeln!(output, "Workouts for {username} ({})", workouts.len());
    for workout in workouts {
        let _ = writeln!(
            output,
            "{}  {}  {}",
            workout.day,
            format_instant(workout.workout_at),
            workout.source
        );
    }
    output.truncate(output.trim_end().len());
    output
}
