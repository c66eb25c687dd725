//! Streak command: current streak, longest streak and this week's progress.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;

use lw_core::{ReferenceZone, StreakSummary};

use super::util::{open_engine, resolve_user};
use crate::Config;

#[derive(Debug, Args)]
pub struct StreakArgs {
    /// User ID or username.
    pub user: String,
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &StreakArgs, config: &Config) -> Result<()> {
    run_at(writer, args, config, Utc::now())
}

fn run_at<W: Write>(
    writer: &mut W,
    args: &StreakArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()> {
    let engine = open_engine(config)?;
    let profile = resolve_user(engine.store(), &args.user)?;
    let summary = engine.streak_summary(&profile.id, now)?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        write_summary(writer, &profile.username, &summary, engine.zone())?;
    }
    Ok(())
}

fn write_summary<W: Write>(
    writer: &mut W,
    username: &str,
    summary: &StreakSummary,
    zone: &ReferenceZone,
) -> Result<()> {
    let progress = &summary.weekly_progress;
    writeln!(writer, "Streak for {username}")?;
    writeln!(writer, "  Current streak: {} weeks", summary.current_streak)?;
    writeln!(writer, "  Longest streak: {} weeks", summary.longest_streak)?;
    writeln!(
        writer,
        "  This week: {}/{} workouts ({} to {})",
        progress.count,
        progress.goal,
        zone.calendar_day(progress.week_start),
        zone.calendar_day(progress.week_end)
    )?;
    if progress.is_met() {
        writeln!(writer, "  Weekly goal met")?;
    } else {
        writeln!(writer, "  {} more to meet this week's goal", progress.remaining())?;
    }
    Ok(())
}
