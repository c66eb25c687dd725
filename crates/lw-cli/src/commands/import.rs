//! Import command for bulk-loading workouts from JSONL.
//!
//! Each line is `{"user": "...", "workout_at": "...", "source": "..."}`.
//! Lines go through the same ingestion path as `lw log`; a workout on a day
//! that already has one is counted as skipped rather than failing the import.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;
use tracing::debug;

use lw_core::{StreakError, UserId, WorkoutSource};

use super::util::{open_engine, resolve_user};
use crate::Config;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Source to apply when incoming workouts omit `source`.
    #[arg(long, default_value_t = WorkoutSource::WearableSync)]
    pub source: WorkoutSource,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub fn run<W: Write>(writer: &mut W, args: &ImportArgs, config: &Config) -> Result<ImportSummary> {
    let stdin = io::stdin();
    import_from(stdin.lock(), writer, args, config, Utc::now())
}

fn import_from<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    args: &ImportArgs,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<ImportSummary> {
    let workouts = parse_workouts(reader)?;

    let mut engine = open_engine(config)?;
    let mut user_ids: HashMap<String, UserId> = HashMap::new();
    let mut summary = ImportSummary::default();

    for (line, workout) in workouts {
        let user_id = if let Some(id) = user_ids.get(&workout.user) {
            id.clone()
        } else {
            let profile = resolve_user(engine.store(), &workout.user)
                .with_context(|| format!("invalid workout on line {line}"))?;
            user_ids.insert(workout.user.clone(), profile.id.clone());
            profile.id
        };

        let source = workout.source.unwrap_or(args.source);
        match engine.log_workout(&user_id, Some(workout.workout_at), source, now) {
            Ok(_) => summary.imported += 1,
            Err(StreakError::DuplicateDay { day, .. }) => {
                debug!(line, %user_id, %day, "skipping duplicate-day workout");
                summary.skipped += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to import line {line}"));
            }
        }
    }

    writeln!(
        writer,
        "Imported {} workouts ({} skipped)",
        summary.imported, summary.skipped
    )?;
    Ok(summary)
}

fn parse_workouts<R: BufRead>(reader: R) -> Result<Vec<(usize, ImportWorkout)>> {
    let mut workouts = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: ImportWorkout = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {line_no}"))?;
        if parsed.user.trim().is_empty() {
            bail!("missing user on line {line_no}");
        }
        workouts.push((line_no, parsed));
    }
    Ok(workouts)
}

#[derive(Debug, Deserialize)]
struct ImportWorkout {
    user: String,
    workout_at: DateTime<Utc>,
    #[serde(default)]
    source: Option<WorkoutSource>,
}
