//! Local date range to UTC window resolution.
//!
//! # Responsibility
//! - Parse user-supplied `YYYY-MM-DD` date pairs.
//! - Translate an inclusive local date range into the inclusive UTC instant
//!   interval covering exactly those local days.
//!
//! # Invariants
//! - The window end is the *next* local midnight minus one tick, resolved in
//!   the zone, so 23/24/25-hour local days are covered exactly.
//! - A reversed range (`start > end`) is rejected, never silently empty.

use super::zone::DisplayZone;
use super::{TimeError, TimeResult};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Inclusive pair of local calendar dates, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Inclusive UTC instant interval used as a persistence filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> TimeResult<Self> {
        if start > end {
            return Err(TimeError::EmptyRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Covers a single local day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Parses two `YYYY-MM-DD` strings into a validated range.
    pub fn parse(start: &str, end: &str) -> TimeResult<Self> {
        Self::new(parse_local_date(start)?, parse_local_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Resolves the range to its inclusive UTC window in the display zone.
    pub fn resolve(&self, zone: &DisplayZone) -> UtcWindow {
        UtcWindow {
            start: zone.local_midnight_utc(self.start),
            end: end_of_local_day_utc(self.end, zone),
        }
    }
}

impl UtcWindow {
    /// The window covering the local day a given instant falls on.
    pub fn day_of(instant: DateTime<Utc>, zone: &DisplayZone) -> Self {
        DateRange::single(zone.local_date(instant)).resolve(zone)
    }

    /// Inclusive containment check, mirroring the persistence filter.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Parses a `YYYY-MM-DD` string into a local calendar date.
pub fn parse_local_date(value: &str) -> TimeResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| TimeError::InvalidDateFormat(value.to_string()))
}

/// Last inclusive UTC instant of the given local day: the next local
/// midnight minus one tick (one microsecond).
pub fn end_of_local_day_utc(date: NaiveDate, zone: &DisplayZone) -> DateTime<Utc> {
    match date.succ_opt() {
        Some(next) => zone.local_midnight_utc(next) - Duration::microseconds(1),
        None => DateTime::<Utc>::MAX_UTC,
    }
}
