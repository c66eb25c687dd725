//! Log command for recording a workout.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;

use lw_core::{StreakError, WorkoutSource};

use super::util::{format_instant, open_engine, parse_datetime, resolve_user};
use crate::Config;

#[derive(Debug, Args)]
pub struct LogArgs {
    /// User ID or username.
    pub user: String,
    /// When the workout happened (RFC 3339 or e.g. "2 days ago"). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
    /// Where the workout came from: manual, external_device or wearable_sync.
    #[arg(long, default_value_t = WorkoutSource::Manual)]
    pub source: WorkoutSource,
}

pub fn run<W: Write>(writer: &mut W, args: &LogArgs, config: &Config) -> Result<()> {
    run_at(writer, args, config, Utc::now())
}

fn run_at<W: Write>(
    writer: &mut W,
    args: &LogArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()> {
    let workout_at = args
        .at
        .as_deref()
        .map(|at| parse_datetime(at, now))
        .transpose()?;

    let mut engine = open_engine(config)?;
    let profile = resolve_user(engine.store(), &args.user)?;

    let workout = match engine.log_workout(&profile.id, workout_at, args.source, now) {
        Ok(workout) => workout,
        Err(StreakError::DuplicateDay { day, .. }) => {
            bail!("{} already logged a workout on {day}", profile.username);
        }
        Err(err) => return Err(err.into()),
    };

    let current = engine.current_streak(&profile.id, now)?;
    writeln!(
        writer,
        "Logged {} workout for {} at {} (day {})",
        workout.source,
        profile.username,
        format_instant(workout.workout_at),
        workout.day
    )?;
    writeln!(writer, "Current streak: {current} weeks")?;
    Ok(())
}
