//! Calendar-day and week arithmetic.
//!
//! # Responsibility
//! - Truncate instants to local calendar days.
//! - Resolve the 7-day week interval containing a day under an explicit
//!   week-start rule.
//!
//! # Invariants
//! - Week intervals always start on the configured weekday.
//! - Nothing here reads ambient locale settings; only `today()` and
//!   `local_day()` read the local time zone.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DAYS_PER_WEEK: u64 = 7;

/// First day of the calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Sunday => "sunday",
        }
    }

    fn days_into_week(self, day: NaiveDate) -> u32 {
        match self {
            Self::Monday => day.weekday().num_days_from_monday(),
            Self::Sunday => day.weekday().num_days_from_sunday(),
        }
    }
}

impl Display for WeekStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized week-start name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWeekStartError(pub String);

impl Display for ParseWeekStartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported week start `{}`; expected monday|sunday",
            self.0
        )
    }
}

impl Error for ParseWeekStartError {}

impl FromStr for WeekStart {
    type Err = ParseWeekStartError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(Self::Monday),
            "sunday" | "sun" => Ok(Self::Sunday),
            other => Err(ParseWeekStartError(other.to_string())),
        }
    }
}

/// Half-open 7-day span `[start, start + 7 days)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekInterval {
    start: NaiveDate,
}

impl WeekInterval {
    /// Returns the week that contains `day`.
    pub fn containing(day: NaiveDate, week_start: WeekStart) -> Self {
        let offset = u64::from(week_start.days_into_week(day));
        let start = day.checked_sub_days(Days::new(offset)).unwrap_or(day);
        Self { start }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day inside the interval.
    pub fn last_day(&self) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(DAYS_PER_WEEK - 1))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        let offset = day.signed_duration_since(self.start).num_days();
        (0..DAYS_PER_WEEK as i64).contains(&offset)
    }

    /// Days of the interval in calendar order.
    ///
    /// Always 7 except in the last week before `NaiveDate::MAX`, which is
    /// cut short rather than repeating a date.
    pub fn days(&self) -> Vec<NaiveDate> {
        (0..DAYS_PER_WEEK)
            .map_while(|offset| self.start.checked_add_days(Days::new(offset)))
            .collect()
    }
}

/// The 7 dates of the week strip around `reference`.
pub fn week_days(reference: NaiveDate, week_start: WeekStart) -> Vec<NaiveDate> {
    WeekInterval::containing(reference, week_start).days()
}

/// Truncates an instant to its calendar day in the instant's own zone.
pub fn start_of_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.date_naive()
}

/// Truncates a UTC instant to the local calendar day.
pub fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Whether two instants fall on the same calendar day of zone `Tz`.
pub fn is_same_day<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    start_of_day(a) == start_of_day(b)
}

/// Current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
