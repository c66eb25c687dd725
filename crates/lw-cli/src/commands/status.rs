//! Status command for showing database and timezone details.

use std::io::Write;

use anyhow::{Context, Result};

use lw_core::ReferenceZone;
use lw_db::Database;

use crate::Config;

/// Opens the database without binding the timezone so a mismatch can be shown.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let users = db.count_users()?;
    let workouts = db.count_workouts()?;
    let bound_zone = db.reference_zone()?;

    writeln!(writer, "Streak tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Timezone: {}", describe_zone(&config.timezone))?;
    writeln!(
        writer,
        "Database timezone: {}",
        bound_zone.as_deref().unwrap_or("not set")
    )?;
    writeln!(writer, "Users: {users}")?;
    writeln!(writer, "Workouts: {workouts}")?;
    Ok(())
}

fn describe_zone(zone: &ReferenceZone) -> String {
    match zone {
        ReferenceZone::Local => match iana_time_zone::get_timezone() {
            Ok(name) => format!("local ({name})"),
            Err(_) => "local".to_string(),
        },
        other => other.to_string(),
    }
}
