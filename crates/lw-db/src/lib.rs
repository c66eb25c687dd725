//! Storage layer for the streak tracker.
//!
//! Provides persistence for users and workouts using `rusqlite`, and
//! implements the [`WorkoutStore`] and [`ProfileStore`] collaborators the
//! streak engine runs against.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization. Separate processes or
//! connections may write concurrently; the invariants below hold regardless.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 UTC with millisecond precision
//! (e.g., `2024-03-04T08:00:00.000Z`), so lexicographic ordering matches
//! chronological ordering. Calendar days are stored as `YYYY-MM-DD`.
//!
//! ## Invariants enforced by the store
//!
//! - One workout per user per calendar day: a unique index on
//!   `(user_id, workout_day)`. A conflicting insert is reported as
//!   [`InsertOutcome::DuplicateDay`], never as an error.
//! - `longest_streak` never decreases: it is only written through a
//!   conditional `UPDATE ... WHERE longest_streak < ?`.
//! - Deleting a user deletes their workouts (`ON DELETE CASCADE`).
//! - Calendar days are only ever computed in one reference timezone: the
//!   first [`Database::bind_reference_zone`] records it in `settings`, and
//!   later binds with a different zone fail with
//!   [`DbError::ReferenceZoneMismatch`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use lw_core::{
    InsertOutcome, LastWorkout, NewWorkout, Profile, ProfileStore, ReferenceZone, UserId,
    WeeklyGoal, Workout, WorkoutId, WorkoutSource, WorkoutStore,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Another user already has this username.
    #[error("username already taken: {0}")]
    UsernameTaken(String),
    /// Usernames that parse as a user ID would shadow that user in lookups.
    #[error("username looks like a user id: {0}")]
    UsernameIsId(String),
    /// The database was initialised with a different reference timezone.
    #[error("database uses timezone {stored}, but {configured} is configured")]
    ReferenceZoneMismatch { stored: String, configured: String },
    /// Failed to parse a stored timestamp or date.
    #[error("invalid timestamp in {table} row {row}: {timestamp}")]
    TimestampParse {
        table: &'static str,
        row: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored value no longer satisfies domain validation.
    #[error("invalid {table} row {row}: {message}")]
    InvalidRow {
        table: &'static str,
        row: String,
        message: String,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A user to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub weekly_goal: WeeklyGoal,
}

const WORKOUT_COLUMNS: &str = "id, user_id, workout_at, workout_day, source";
const REFERENCE_ZONE_KEY: &str = "reference_zone";
const USER_COLUMNS: &str =
    "id, username, first_name, last_name, weekly_goal, longest_streak, created_at";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                weekly_goal INTEGER NOT NULL DEFAULT 3 CHECK (weekly_goal BETWEEN 1 AND 7),
                longest_streak INTEGER NOT NULL DEFAULT 0 CHECK (longest_streak >= 0),
                created_at TEXT NOT NULL
            );

            -- Workouts table: one row per logged workout
            -- workout_at: RFC 3339 UTC (e.g., '2024-03-04T08:00:00.000Z')
            -- workout_day: calendar day in the engine's reference timezone
            CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                workout_at TEXT NOT NULL,
                workout_day TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT 'manual',
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_workouts_user_day ON workouts(user_id, workout_day);
            CREATE INDEX IF NOT EXISTS idx_workouts_user_at ON workouts(user_id, workout_at);
            CREATE INDEX IF NOT EXISTS idx_workouts_at ON workouts(workout_at);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Pins the timezone that `workout_day` values are computed in.
    ///
    /// The first call records `zone`; later calls succeed only with the same
    /// zone. `local` is recorded together with the host's IANA zone name, so
    /// moving the host to another zone also counts as a change.
    pub fn bind_reference_zone(&mut self, zone: &ReferenceZone) -> Result<(), DbError> {
        let configured = zone_key(zone);
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO NOTHING",
            params![REFERENCE_ZONE_KEY, configured],
        )?;
        let stored = self.reference_zone()?.unwrap_or_default();
        if stored != configured {
            return Err(DbError::ReferenceZoneMismatch { stored, configured });
        }
        debug!(zone = %stored, "reference zone bound");
        Ok(())
    }

    /// The recorded reference timezone, if one has been bound.
    pub fn reference_zone(&self) -> Result<Option<String>, DbError> {
        let stored = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                [REFERENCE_ZONE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stored)
    }

    /// Registers a user with a fresh UUID.
    pub fn create_user(&mut self, user: &NewUser) -> Result<Profile, DbError> {
        if Uuid::parse_str(user.username.trim()).is_ok() {
            return Err(DbError::UsernameIsId(user.username.clone()));
        }
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let result = self.conn.execute(
            "
            INSERT INTO users (id, username, first_name, last_name, weekly_goal, longest_streak, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            ",
            params![
                id,
                user.username,
                user.first_name,
                user.last_name,
                i64::from(user.weekly_goal),
                format_timestamp(created_at),
            ],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(DbError::UsernameTaken(user.username.clone()));
            }
            Err(err) => return Err(err.into()),
        }
        debug!(user_id = %id, username = %user.username, "user created");

        self.profile_where("id", &id)?
            .ok_or_else(|| DbError::InvalidRow {
                table: "users",
                row: id,
                message: "row missing after insert".to_string(),
            })
    }

    /// Looks a user up by ID, then by username.
    pub fn find_user(&self, id_or_username: &str) -> Result<Option<Profile>, DbError> {
        if let Some(profile) = self.profile_where("id", id_or_username)? {
            return Ok(Some(profile));
        }
        self.profile_where("username", id_or_username)
    }

    /// Deletes a user and, by cascade, their workouts.
    ///
    /// Returns whether a user was deleted.
    pub fn delete_user(&mut self, user_id: &UserId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM users WHERE id = ?", [user_id.as_str()])?;
        Ok(deleted > 0)
    }

    /// Most recent workout for a user.
    pub fn latest_workout(&self, user_id: &UserId) -> Result<Option<Workout>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "
                    SELECT {WORKOUT_COLUMNS}
                    FROM workouts
                    WHERE user_id = ?
                    ORDER BY workout_at DESC, id DESC
                    LIMIT 1
                    "
                ),
                [user_id.as_str()],
                WorkoutRow::from_row,
            )
            .optional()?;
        row.map(WorkoutRow::into_workout).transpose()
    }

    /// Total number of registered users.
    pub fn count_users(&self) -> Result<u64, DbError> {
        self.count_rows("users")
    }

    /// Total number of stored workouts.
    pub fn count_workouts(&self) -> Result<u64, DbError> {
        self.count_rows("workouts")
    }

    fn count_rows(&self, table: &str) -> Result<u64, DbError> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn profile_where(&self, column: &str, value: &str) -> Result<Option<Profile>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?"),
                [value],
                UserRow::from_row,
            )
            .optional()?;
        row.map(UserRow::into_profile).transpose()
    }

    fn query_workouts(
        &self,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Workout>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {WORKOUT_COLUMNS}
            FROM workouts
            WHERE {filter}
            ORDER BY workout_at ASC, id ASC
            "
        ))?;
        let rows = stmt.query_map(params, WorkoutRow::from_row)?;
        let mut workouts = Vec::new();
        for row in rows {
            workouts.push(row?.into_workout()?);
        }
        Ok(workouts)
    }
}

impl WorkoutStore for Database {
    type Error = DbError;

    fn insert_workout(&mut self, workout: &NewWorkout) -> Result<InsertOutcome, DbError> {
        let inserted = self.conn.execute(
            "
            INSERT INTO workouts (user_id, workout_at, workout_day, source)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, workout_day) DO NOTHING
            ",
            params![
                workout.user_id.as_str(),
                format_timestamp(workout.workout_at),
                format_day(workout.day),
                workout.source.as_str(),
            ],
        )?;
        if inserted == 0 {
            return Ok(InsertOutcome::DuplicateDay);
        }
        Ok(InsertOutcome::Inserted(WorkoutId::new(
            self.conn.last_insert_rowid(),
        )))
    }

    fn workouts_for_user(&self, user_id: &UserId) -> Result<Vec<Workout>, DbError> {
        self.query_workouts("user_id = ?", &[&user_id.as_str()])
    }

    /// The range is inclusive of `start` and exclusive of `end`.
    fn workouts_in_range(
        &self,
        user_id: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Workout>, DbError> {
        if end <= start {
            return Ok(Vec::new());
        }
        self.query_workouts(
            "user_id = ? AND workout_at >= ? AND workout_at < ?",
            &[
                &user_id.as_str(),
                &format_timestamp(start),
                &format_timestamp(end),
            ],
        )
    }

    fn has_workout_on(&self, user_id: &UserId, day: NaiveDate) -> Result<bool, DbError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM workouts WHERE user_id = ? AND workout_day = ?)",
            params![user_id.as_str(), format_day(day)],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn last_workout_per_user(&self) -> Result<Vec<LastWorkout>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT user_id, MAX(workout_at) AS last_workout
            FROM workouts
            GROUP BY user_id
            ORDER BY last_workout DESC, user_id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut latest = Vec::new();
        for row in rows {
            let (user_id, last_workout) = row?;
            latest.push(LastWorkout {
                last_workout_at: parse_timestamp(&last_workout, "workouts", &user_id)?,
                user_id: parse_user_id(user_id, "workouts")?,
            });
        }
        Ok(latest)
    }
}

impl ProfileStore for Database {
    type Error = DbError;

    fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, DbError> {
        self.profile_where("id", user_id.as_str())
    }

    fn raise_longest_streak(&mut self, user_id: &UserId, value: u32) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE users SET longest_streak = ?2 WHERE id = ?1 AND longest_streak < ?2",
            params![user_id.as_str(), value],
        )?;
        Ok(updated > 0)
    }

    fn set_weekly_goal(&mut self, user_id: &UserId, goal: WeeklyGoal) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE users SET weekly_goal = ? WHERE id = ?",
            params![i64::from(goal), user_id.as_str()],
        )?;
        Ok(updated > 0)
    }
}

#[derive(Debug)]
struct WorkoutRow {
    id: i64,
    user_id: String,
    workout_at: String,
    workout_day: String,
    source: String,
}

impl WorkoutRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            workout_at: row.get(2)?,
            workout_day: row.get(3)?,
            source: row.get(4)?,
        })
    }

    fn into_workout(self) -> Result<Workout, DbError> {
        let row_id = self.id.to_string();
        let workout_at = parse_timestamp(&self.workout_at, "workouts", &row_id)?;
        let day = NaiveDate::parse_from_str(&self.workout_day, "%Y-%m-%d").map_err(|source| {
            DbError::TimestampParse {
                table: "workouts",
                row: row_id.clone(),
                timestamp: self.workout_day.clone(),
                source,
            }
        })?;
        let source: WorkoutSource = self.source.parse().map_err(|err| DbError::InvalidRow {
            table: "workouts",
            row: row_id.clone(),
            message: format!("{err}"),
        })?;
        Ok(Workout {
            id: WorkoutId::new(self.id),
            user_id: parse_user_id(self.user_id, "workouts")?,
            workout_at,
            day,
            source,
        })
    }
}

#[derive(Debug)]
struct UserRow {
    id: String,
    username: String,
    first_name: String,
    last_name: String,
    weekly_goal: i64,
    longest_streak: i64,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            weekly_goal: row.get(4)?,
            longest_streak: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_profile(self) -> Result<Profile, DbError> {
        let invalid = |message: String| DbError::InvalidRow {
            table: "users",
            row: self.id.clone(),
            message,
        };
        let weekly_goal = WeeklyGoal::new(self.weekly_goal).map_err(|err| invalid(err.to_string()))?;
        let longest_streak = u32::try_from(self.longest_streak)
            .map_err(|_| invalid(format!("longest_streak out of range: {}", self.longest_streak)))?;
        let created_at = parse_timestamp(&self.created_at, "users", &self.id)?;
        Ok(Profile {
            id: parse_user_id(self.id, "users")?,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            weekly_goal,
            longest_streak,
            created_at,
        })
    }
}

/// Identity recorded for a reference zone.
fn zone_key(zone: &ReferenceZone) -> String {
    match zone {
        ReferenceZone::Local => iana_time_zone::get_timezone()
            .map_or_else(|_| "local".to_string(), |name| format!("local:{name}")),
        other => other.to_string(),
    }
}

fn parse_user_id(id: String, table: &'static str) -> Result<UserId, DbError> {
    UserId::new(id.clone()).map_err(|err| DbError::InvalidRow {
        table,
        row: id,
        message: err.to_string(),
    })
}

fn parse_timestamp(timestamp: &str, table: &'static str, row: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            table,
            row: row.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
