//! Day-bucketer for timestamped records.
//!
//! # Responsibility
//! - Group `(Instant, payload)` pairs by the payload's local calendar day.
//!
//! # Invariants
//! - Buckets are ordered by local date descending (newest day first).
//! - Members within a bucket are ordered by instant ascending.
//! - Records with equal instants keep their input order (stable sort).
//! - An instant exactly at local midnight belongs to the day whose midnight
//!   it is, never the previous day.

use super::zone::DisplayZone;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// One local calendar day with its records, ordered by ascending instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket<T> {
    pub date: NaiveDate,
    pub records: Vec<T>,
}

impl<T> DayBucket<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Groups records by their local calendar day in the display zone.
///
/// Grouping uses date equality only; ordering is applied on output:
/// buckets newest-first, members oldest-first within each bucket.
pub fn bucket_by_local_day<T>(
    records: Vec<(DateTime<Utc>, T)>,
    zone: &DisplayZone,
) -> Vec<DayBucket<T>> {
    let mut groups: BTreeMap<NaiveDate, Vec<(DateTime<Utc>, T)>> = BTreeMap::new();
    for (instant, payload) in records {
        groups
            .entry(zone.local_date(instant))
            .or_default()
            .push((instant, payload));
    }

    groups
        .into_iter()
        .rev()
        .map(|(date, mut members)| {
            members.sort_by_key(|(instant, _)| *instant);
            DayBucket {
                date,
                records: members.into_iter().map(|(_, payload)| payload).collect(),
            }
        })
        .collect()
}
