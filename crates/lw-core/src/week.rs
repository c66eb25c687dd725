//! Calendar days and Monday-anchored week buckets.
//!
//! Every instant is interpreted in a single [`ReferenceZone`]. Calendar days
//! (for the one-workout-per-day rule) and week buckets (for adherence) are
//! always derived through the same zone so the two never disagree.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveTime, TimeZone,
    Utc,
};
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// The timezone in which calendar days and weeks are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceZone {
    /// The host's local timezone, DST included.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl ReferenceZone {
    /// Returns the calendar day containing `at`.
    #[must_use]
    pub fn calendar_day(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => at.with_timezone(&Local).date_naive(),
            Self::Utc => at.date_naive(),
            Self::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }

    /// Returns the first instant of `day`.
    #[must_use]
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        match self {
            Self::Local => midnight_to_utc(&Local, day),
            Self::Utc => midnight_to_utc(&Utc, day),
            Self::Fixed(offset) => midnight_to_utc(offset, day),
        }
    }
}

/// Converts a date at midnight in `tz` to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn midnight_to_utc<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // DST spring-forward gap at midnight; 1am local exists.
            let one_am = midnight + Duration::hours(1);
            tz.from_local_datetime(&one_am)
                .earliest()
                .map_or_else(|| Utc.from_utc_datetime(&midnight), |dt| dt.with_timezone(&Utc))
        }
    }
}

impl fmt::Display for ReferenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Utc => write!(f, "utc"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for ReferenceZone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTimeZone {
            value: s.to_string(),
        };
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(Self::Local),
            "utc" | "z" => return Ok(Self::Utc),
            _ => {}
        }

        let (sign, rest) = match trimmed.split_at_checked(1) {
            Some(("+", rest)) => (1, rest),
            Some(("-", rest)) => (-1, rest),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..60).contains(&minutes) {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::Fixed)
            .ok_or_else(invalid)
    }
}

impl Serialize for ReferenceZone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ReferenceZone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A week bucket, identified by its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    /// The week containing `day`.
    #[must_use]
    pub fn for_day(day: NaiveDate) -> Self {
        let days_since_monday = day.weekday().num_days_from_monday();
        Self(day - Duration::days(i64::from(days_since_monday)))
    }

    /// The week containing `at` in `zone`.
    #[must_use]
    pub fn containing(zone: &ReferenceZone, at: DateTime<Utc>) -> Self {
        Self::for_day(zone.calendar_day(at))
    }

    #[must_use]
    pub const fn monday(self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn sunday(self) -> NaiveDate {
        self.0 + Duration::days(6)
    }

    #[must_use]
    pub fn previous(self) -> Self {
        Self(self.0 - Duration::days(7))
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + Duration::days(7))
    }

    /// Week boundaries (Mon 00:00 to next Mon 00:00) as a half-open interval.
    #[must_use]
    pub fn bounds(self, zone: &ReferenceZone) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            zone.start_of_day(self.0),
            zone.start_of_day(self.next().0),
        )
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
