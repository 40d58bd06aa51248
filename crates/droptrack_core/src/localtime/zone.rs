//! Display-zone converter.
//!
//! # Responsibility
//! - Hold the single fixed IANA zone used for all user-facing date grouping
//!   and date-input interpretation.
//! - Apply the zone's UTC offset *at the projected instant*, so daylight
//!   saving transitions are honored rather than a fixed offset.
//!
//! # Invariants
//! - Ambiguous wall-clock times (fall-back overlap) resolve to the earlier
//!   of the two candidate instants.
//! - Nonexistent wall-clock times (spring-forward gap) shift forward to the
//!   first valid wall-clock instant.

use super::{TimeError, TimeResult};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Fixed presentation zone for the whole system; not per-request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayZone {
    tz: Tz,
}

const GAP_SCAN_STEP_MINUTES: i64 = 15;
// Offset gaps in tz data are at most a couple of hours; a three-hour scan
// bound always terminates.
const GAP_SCAN_STEPS: i64 = 3 * 60 / GAP_SCAN_STEP_MINUTES;

impl DisplayZone {
    /// Parses an IANA zone name, e.g. `America/Los_Angeles`.
    pub fn new(name: &str) -> TimeResult<Self> {
        let tz: Tz = name
            .trim()
            .parse()
            .map_err(|_| TimeError::InvalidZone(name.to_string()))?;
        Ok(Self { tz })
    }

    /// Returns the canonical IANA name of the zone.
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Projects a UTC instant into zone-local time.
    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// Returns the local calendar date of a UTC instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.to_local(instant).date_naive()
    }

    /// Resolves a naive zone-local wall-clock time to a UTC instant.
    ///
    /// Deterministic across DST transitions:
    /// - unique mapping: that instant;
    /// - ambiguous (clocks rolled back): the earlier candidate;
    /// - nonexistent (clocks jumped forward): the first valid wall-clock
    ///   instant at or after the requested one.
    pub fn resolve_local(&self, wall: NaiveDateTime) -> DateTime<Utc> {
        let mut candidate = wall;
        for _ in 0..=GAP_SCAN_STEPS {
            match self.tz.from_local_datetime(&candidate) {
                LocalResult::Single(resolved) => return resolved.with_timezone(&Utc),
                LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
                LocalResult::None => {
                    candidate = candidate + Duration::minutes(GAP_SCAN_STEP_MINUTES);
                }
            }
        }
        // Unreachable with real tz data; interpret as UTC rather than panic.
        Utc.from_utc_datetime(&wall)
    }

    /// Returns the UTC instant of local midnight on the given date.
    pub fn local_midnight_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_local(date.and_time(NaiveTime::MIN))
    }
}
