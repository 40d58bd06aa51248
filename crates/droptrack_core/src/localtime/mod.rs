//! Local-time projection core.
//!
//! # Responsibility
//! - Project stored UTC instants into the configured display zone.
//! - Group timestamped records by local calendar day.
//! - Translate inclusive local date ranges into inclusive UTC windows.
//!
//! # Invariants
//! - Storage never holds localized values; projection happens here, at read
//!   time, through one converter.
//! - All range math is DST-correct: day boundaries are computed as local
//!   midnights in the zone and converted independently to UTC.
//! - The smallest representable unit (tick) is one microsecond.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod bucket;
pub mod range;
pub mod zone;

pub use bucket::{bucket_by_local_day, DayBucket};
pub use range::{DateRange, UtcWindow};
pub use zone::DisplayZone;

pub type TimeResult<T> = Result<T, TimeError>;

/// Validation error for zone and date-range inputs.
///
/// The converter and bucketer never fail on well-formed input; only raw
/// user-supplied strings (zone names, `YYYY-MM-DD` dates) can be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    /// The configured zone name is not a known IANA identifier.
    InvalidZone(String),
    /// Input string is not a parseable `YYYY-MM-DD` calendar date.
    InvalidDateFormat(String),
    /// Range start is after range end.
    EmptyRange { start: NaiveDate, end: NaiveDate },
}

impl Display for TimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidZone(name) => write!(f, "unknown time zone: `{name}`"),
            Self::InvalidDateFormat(value) => {
                write!(f, "invalid date `{value}`; expected YYYY-MM-DD")
            }
            Self::EmptyRange { start, end } => {
                write!(f, "start date {start} is after end date {end}")
            }
        }
    }
}

impl Error for TimeError {}
