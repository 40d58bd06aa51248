//! Admin reporting service.
//!
//! # Responsibility
//! - CSV export of every drop-off joined with its owner's phone number.
//! - Admin record search by phone substring and open-ended local date
//!   bounds.
//!
//! # Invariants
//! - Exported timestamps are UTC, never localized.
//! - Date bounds are resolved as local midnights in the display zone; a
//!   reversed pair of bounds is rejected.

use crate::localtime::range::{end_of_local_day_utc, parse_local_date};
use crate::localtime::{DateRange, DisplayZone, TimeError};
use crate::model::user::User;
use crate::repo::dropoff_repo::{DropoffRepository, DropoffSearchFilter, DropoffWithOwner};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};

/// Service error for reporting use-cases.
#[derive(Debug)]
pub enum ReportError {
    /// Acting user lacks the admin flag.
    NotAuthorized,
    /// Date input or range failure.
    Time(TimeError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized => write!(f, "administrative access required"),
            Self::Time(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotAuthorized => None,
            Self::Time(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<TimeError> for ReportError {
    fn from(value: TimeError) -> Self {
        Self::Time(value)
    }
}

impl From<RepoError> for ReportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

const CSV_HEADER: &str = "id,tracking_number,dropped_at_utc,owner_phone";

/// Reporting service facade over the drop-off repository.
pub struct ReportService<R: DropoffRepository> {
    repo: R,
    zone: DisplayZone,
}

impl<R: DropoffRepository> ReportService<R> {
    pub fn new(repo: R, zone: DisplayZone) -> Self {
        Self { repo, zone }
    }

    /// Admin: renders every drop-off as CSV, newest first.
    pub fn export_all_csv(&self, acting: &User) -> Result<String, ReportError> {
        require_admin(acting)?;

        let records = self.repo.list_all_with_owner()?;
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for entry in &records {
            let _ = writeln!(
                out,
                "{},{},{},{}",
                csv_field(&entry.record.id.to_string()),
                csv_field(&entry.record.tracking_number),
                csv_field(
                    &entry
                        .record
                        .dropped_at
                        .format("%Y-%m-%d %H:%M:%S UTC")
                        .to_string()
                ),
                csv_field(&entry.owner_phone),
            );
        }

        info!(
            "event=report_csv_export module=report status=ok admin={} rows={}",
            acting.id,
            records.len()
        );
        Ok(out)
    }

    /// Admin: searches all records by phone substring and/or local date
    /// bounds. Either bound may be omitted; a reversed pair is rejected.
    pub fn search_dropoffs(
        &self,
        acting: &User,
        phone_contains: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<DropoffWithOwner>, ReportError> {
        require_admin(acting)?;

        let start = start_date.map(parse_local_date).transpose()?;
        let end = end_date.map(parse_local_date).transpose()?;
        if let (Some(start), Some(end)) = (start, end) {
            DateRange::new(start, end)?;
        }

        let filter = DropoffSearchFilter {
            phone_contains: phone_contains.map(str::to_string),
            window_start: start.map(|date| self.zone.local_midnight_utc(date)),
            window_end: end.map(|date| end_of_local_day_utc(date, &self.zone)),
        };
        Ok(self.repo.search_with_owner(&filter)?)
    }
}

fn require_admin(acting: &User) -> Result<(), ReportError> {
    if acting.is_admin {
        Ok(())
    } else {
        Err(ReportError::NotAuthorized)
    }
}

/// Quotes a CSV field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::csv_field;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(csv_field("1Z999AA10123456784"), "1Z999AA10123456784");
    }

    #[test]
    fn delimiters_and_quotes_are_escaped() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }
}
