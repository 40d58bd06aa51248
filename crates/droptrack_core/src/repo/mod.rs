//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for accounts and
//!   drop-off records.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce model validation before persistence.
//! - Repository APIs return semantic errors (`UserNotFound`,
//!   `DropoffNotFound`) in addition to DB transport errors.
//! - Instants cross the SQL boundary as UTC epoch microseconds.

use crate::db::DbError;
use crate::model::dropoff::{DropoffId, DropoffValidationError};
use crate::model::user::{UserId, UserValidationError};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod dropoff_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    UserValidation(UserValidationError),
    DropoffValidation(DropoffValidationError),
    Db(DbError),
    UserNotFound(UserId),
    DropoffNotFound(DropoffId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserValidation(err) => write!(f, "{err}"),
            Self::DropoffValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::DropoffNotFound(id) => write!(f, "drop-off record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UserValidation(err) => Some(err),
            Self::DropoffValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UserNotFound(_) | Self::DropoffNotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::UserValidation(value)
    }
}

impl From<DropoffValidationError> for RepoError {
    fn from(value: DropoffValidationError) -> Self {
        Self::DropoffValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn instant_to_us(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_micros()
}

pub(crate) fn instant_from_us(us: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(us).ok_or_else(|| {
        RepoError::InvalidData(format!("out-of-range timestamp `{us}` in {column}"))
    })
}

pub(crate) fn parse_uuid(text: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}
