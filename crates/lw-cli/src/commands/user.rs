//! User management commands.

use std::io::Write;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use lw_core::WeeklyGoal;
use lw_db::NewUser;

use super::util::{format_instant, open_database, open_engine, resolve_user};
use crate::Config;

/// User subcommands.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Register a new user.
    Add(AddArgs),

    /// Show a user's profile.
    Show {
        /// User ID or username.
        user: String,
    },

    /// Change a user's weekly goal. Values outside 1-7 are clamped.
    Goal {
        /// User ID or username.
        user: String,
        /// Workouts per week.
        #[arg(allow_negative_numbers = true)]
        goal: i64,
    },

    /// Remove a user and all of their workouts.
    Remove {
        /// User ID or username.
        user: String,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Unique username.
    pub username: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    /// Workouts per week needed to keep a streak (1-7).
    #[arg(long, default_value_t = i64::from(WeeklyGoal::DEFAULT))]
    pub goal: i64,
}

pub fn run<W: Write>(writer: &mut W, action: &UserAction, config: &Config) -> Result<()> {
    match action {
        UserAction::Add(args) => add(writer, args, config),
        UserAction::Show { user } => show(writer, user, config),
        UserAction::Goal { user, goal } => set_goal(writer, user, *goal, config),
        UserAction::Remove { user } => remove(writer, user, config),
    }
}

fn add<W: Write>(writer: &mut W, args: &AddArgs, config: &Config) -> Result<()> {
    let new = NewUser {
        username: required("username", &args.username)?,
        first_name: required("first name", &args.first_name)?,
        last_name: required("last name", &args.last_name)?,
        weekly_goal: WeeklyGoal::new(args.goal)?,
    };

    let mut db = open_database(config)?;
    let profile = db.create_user(&new)?;
    writeln!(
        writer,
        "Added user {} ({}) with a weekly goal of {}",
        profile.username, profile.id, profile.weekly_goal
    )?;
    Ok(())
}

fn show<W: Write>(writer: &mut W, user: &str, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let profile = resolve_user(&db, user)?;

    writeln!(writer, "User {}", profile.username)?;
    writeln!(writer, "  ID: {}", profile.id)?;
    writeln!(writer, "  Name: {} {}", profile.first_name, profile.last_name)?;
    writeln!(writer, "  Weekly goal: {}", profile.weekly_goal)?;
    writeln!(writer, "  Longest streak: {} weeks", profile.longest_streak)?;
    writeln!(writer, "  Joined: {}", format_instant(profile.created_at))?;
    match db.latest_workout(&profile.id)? {
        Some(workout) => writeln!(
            writer,
            "  Last workout: {} ({})",
            format_instant(workout.workout_at),
            workout.source
        )?,
        None => writeln!(writer, "  Last workout: none")?,
    }
    Ok(())
}

fn set_goal<W: Write>(writer: &mut W, user: &str, goal: i64, config: &Config) -> Result<()> {
    let mut engine = open_engine(config)?;
    let profile = resolve_user(engine.store(), user)?;
    let applied = engine.set_weekly_goal(&profile.id, goal)?;
    writeln!(
        writer,
        "Weekly goal for {} set to {applied}",
        profile.username
    )?;
    Ok(())
}

fn remove<W: Write>(writer: &mut W, user: &str, config: &Config) -> Result<()> {
    let mut db = open_database(config)?;
    let profile = resolve_user(&db, user)?;
    db.delete_user(&profile.id)?;
    writeln!(writer, "Removed user {}", profile.username)?;
    Ok(())
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{field} cannot be empty");
    }
    Ok(trimmed.to_string())
}
