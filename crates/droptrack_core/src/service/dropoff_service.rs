//! Drop-off use-case service.
//!
//! # Responsibility
//! - Record/delete/edit drop-offs for an owning user.
//! - Produce the day-grouped dashboard, per-day receipt data and local
//!   date-range search results.
//!
//! # Invariants
//! - Every read projection goes through the single display-zone converter;
//!   stored instants stay UTC.
//! - A user cannot read or delete another user's records.
//! - Tracking numbers are unique per user on add, and unique across all
//!   records on admin edit.

use crate::config::CompanyInfo;
use crate::localtime::{
    bucket_by_local_day, DateRange, DisplayZone, TimeError, UtcWindow,
};
use crate::model::dropoff::{
    normalize_tracking_number, Dropoff, DropoffId, DropoffValidationError,
};
use crate::model::user::{User, UserId};
use crate::repo::dropoff_repo::DropoffRepository;
use crate::repo::RepoError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for drop-off use-cases.
#[derive(Debug)]
pub enum DropoffError {
    /// The user already recorded this tracking number.
    DuplicateTrackingNumber(String),
    /// Another record (any user) already carries this tracking number.
    TrackingNumberInUse(String),
    /// Record does not exist or is not visible to the caller.
    RecordNotFound(DropoffId),
    /// Acting user lacks the admin flag.
    NotAuthorized,
    /// Tracking-number validation failure.
    Validation(DropoffValidationError),
    /// Date input or range failure.
    Time(TimeError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for DropoffError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTrackingNumber(value) => {
                write!(f, "tracking number {value} already exists for this account")
            }
            Self::TrackingNumberInUse(value) => {
                write!(f, "tracking number {value} already exists for another record")
            }
            Self::RecordNotFound(id) => write!(f, "drop-off record not found: {id}"),
            Self::NotAuthorized => write!(f, "administrative access required"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Time(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent drop-off state: {details}")
            }
        }
    }
}

impl Error for DropoffError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Time(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DropoffError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DropoffNotFound(id) => Self::RecordNotFound(id),
            RepoError::DropoffValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<DropoffValidationError> for DropoffError {
    fn from(value: DropoffValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TimeError> for DropoffError {
    fn from(value: TimeError) -> Self {
        Self::Time(value)
    }
}

/// A record paired with its wall-clock projection in the display zone.
///
/// Formatting the projection is the presentation layer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalDropoff {
    pub record: Dropoff,
    pub local_time: NaiveDateTime,
}

/// One dashboard day: a local date with its records, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardDay {
    pub date: NaiveDate,
    pub package_count: usize,
    /// Id of the day's first record; callers use it to request the day's
    /// receipt.
    pub reference: DropoffId,
    pub records: Vec<LocalDropoff>,
}

/// Day-grouped view of a user's full drop-off history, newest day first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub days: Vec<DashboardDay>,
    pub total_packages: usize,
}

/// Receipt data for one local day; rendering is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub receipt_date: NaiveDate,
    pub company_name: String,
    pub company_address: String,
    pub items: Vec<LocalDropoff>,
    pub total_packages: usize,
}

/// Result of a local date-range search, oldest record first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeSearch {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub items: Vec<LocalDropoff>,
    pub total_packages: usize,
}

/// Drop-off service facade over a record repository.
pub struct DropoffService<R: DropoffRepository> {
    repo: R,
    zone: DisplayZone,
}

impl<R: DropoffRepository> DropoffService<R> {
    /// Creates a service projecting through the given display zone.
    pub fn new(repo: R, zone: DisplayZone) -> Self {
        Self { repo, zone }
    }

    pub fn zone(&self) -> &DisplayZone {
        &self.zone
    }

    /// Records a drop-off for the user, timestamped now (UTC).
    pub fn add_dropoff(
        &self,
        user_id: UserId,
        tracking_number: &str,
    ) -> Result<Dropoff, DropoffError> {
        self.add_dropoff_at(user_id, tracking_number, Utc::now())
    }

    /// Records a drop-off at an explicit instant (imports, backfills).
    pub fn add_dropoff_at(
        &self,
        user_id: UserId,
        tracking_number: &str,
        dropped_at: DateTime<Utc>,
    ) -> Result<Dropoff, DropoffError> {
        let tracking_number = normalize_tracking_number(tracking_number)?;
        if self
            .repo
            .tracking_number_exists_for_user(user_id, &tracking_number)?
        {
            return Err(DropoffError::DuplicateTrackingNumber(tracking_number));
        }

        let record = Dropoff::with_id_at(
            uuid::Uuid::new_v4(),
            user_id,
            tracking_number,
            dropped_at,
        )?;
        let id = self.repo.create_dropoff(&record)?;

        info!("event=dropoff_add module=dropoff status=ok user={user_id} record={id}");
        self.repo
            .get_dropoff(id)?
            .ok_or(DropoffError::InconsistentState(
                "created record not found in read-back",
            ))
    }

    /// Deletes one of the user's own records.
    pub fn delete_dropoff(&self, user_id: UserId, id: DropoffId) -> Result<(), DropoffError> {
        self.repo.delete_dropoff_for_user(id, user_id)?;
        info!("event=dropoff_delete module=dropoff status=ok user={user_id} record={id}");
        Ok(())
    }

    /// Admin: rewrites a record's tracking number.
    ///
    /// Rejected when any other record already carries the new number.
    pub fn edit_tracking_number(
        &self,
        acting: &User,
        id: DropoffId,
        tracking_number: &str,
    ) -> Result<Dropoff, DropoffError> {
        if !acting.is_admin {
            return Err(DropoffError::NotAuthorized);
        }
        let tracking_number = normalize_tracking_number(tracking_number)?;

        if self.repo.get_dropoff(id)?.is_none() {
            return Err(DropoffError::RecordNotFound(id));
        }
        if self
            .repo
            .tracking_number_exists_elsewhere(&tracking_number, id)?
        {
            return Err(DropoffError::TrackingNumberInUse(tracking_number));
        }

        self.repo.update_tracking_number(id, &tracking_number)?;
        info!(
            "event=dropoff_edit module=dropoff status=ok admin={} record={id}",
            acting.id
        );
        self.repo
            .get_dropoff(id)?
            .ok_or(DropoffError::InconsistentState(
                "edited record not found in read-back",
            ))
    }

    /// Builds the day-grouped dashboard for a user's full history.
    pub fn dashboard(&self, user_id: UserId) -> Result<Dashboard, DropoffError> {
        let records = self.repo.list_for_user(user_id)?;
        let total_packages = records.len();

        let stamped = records
            .into_iter()
            .map(|record| (record.dropped_at, record))
            .collect();
        let days = bucket_by_local_day(stamped, &self.zone)
            .into_iter()
            .filter_map(|bucket| {
                // Buckets are non-empty by construction.
                let reference = bucket.records.first()?.id;
                Some(DashboardDay {
                    date: bucket.date,
                    package_count: bucket.records.len(),
                    reference,
                    records: self.project(bucket.records),
                })
            })
            .collect();

        Ok(Dashboard {
            days,
            total_packages,
        })
    }

    /// Builds receipt data for the local day of one of the user's records.
    pub fn receipt_for(
        &self,
        user_id: UserId,
        reference: DropoffId,
        company: &CompanyInfo,
    ) -> Result<Receipt, DropoffError> {
        let record = self
            .repo
            .get_dropoff_for_user(reference, user_id)?
            .ok_or(DropoffError::RecordNotFound(reference))?;

        let receipt_date = self.zone.local_date(record.dropped_at);
        let window = UtcWindow::day_of(record.dropped_at, &self.zone);
        let same_day = self.repo.list_for_user_in_window(user_id, window)?;
        let total_packages = same_day.len();

        Ok(Receipt {
            receipt_date,
            company_name: company.name.clone(),
            company_address: company.address.clone(),
            items: self.project(same_day),
            total_packages,
        })
    }

    /// Searches the user's records by an inclusive local date range.
    pub fn search_range(
        &self,
        user_id: UserId,
        start: &str,
        end: &str,
    ) -> Result<RangeSearch, DropoffError> {
        let range = DateRange::parse(start, end)?;
        let window = range.resolve(&self.zone);
        let records = self.repo.list_for_user_in_window(user_id, window)?;
        let total_packages = records.len();

        Ok(RangeSearch {
            start: range.start(),
            end: range.end(),
            items: self.project(records),
            total_packages,
        })
    }

    fn project(&self, records: Vec<Dropoff>) -> Vec<LocalDropoff> {
        records
            .into_iter()
            .map(|record| LocalDropoff {
                local_time: self.zone.to_local(record.dropped_at).naive_local(),
                record,
            })
            .collect()
    }
}
