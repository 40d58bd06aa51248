//! Drop-off record model.
//!
//! # Responsibility
//! - Define the tracked-package record: owner, tracking number, instant.
//!
//! # Invariants
//! - `dropped_at` is always a UTC instant; it defaults to "now" at creation
//!   and is immutable afterwards except through explicit admin edits.
//! - `tracking_number` is stored trimmed, 5 to 100 characters.

use crate::model::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a drop-off record.
pub type DropoffId = Uuid;

pub const TRACKING_NUMBER_MIN_CHARS: usize = 5;
pub const TRACKING_NUMBER_MAX_CHARS: usize = 100;

/// Validation error for drop-off fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropoffValidationError {
    /// Tracking number is outside the 5-100 character window after trimming.
    InvalidTrackingNumber(String),
}

impl Display for DropoffValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTrackingNumber(value) => write!(
                f,
                "invalid tracking number `{value}`; expected {TRACKING_NUMBER_MIN_CHARS}-{TRACKING_NUMBER_MAX_CHARS} characters"
            ),
        }
    }
}

impl Error for DropoffValidationError {}

/// One recorded package drop-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dropoff {
    /// Stable global ID.
    pub id: DropoffId,
    /// Owning account.
    pub user_id: UserId,
    /// Carrier tracking identifier, trimmed.
    pub tracking_number: String,
    /// Drop-off instant, UTC.
    pub dropped_at: DateTime<Utc>,
}

impl Dropoff {
    /// Creates a record with a generated id, timestamped now.
    pub fn new(
        user_id: UserId,
        tracking_number: impl Into<String>,
    ) -> Result<Self, DropoffValidationError> {
        Self::with_id_at(Uuid::new_v4(), user_id, tracking_number, Utc::now())
    }

    /// Creates a record with caller-provided identity and instant.
    pub fn with_id_at(
        id: DropoffId,
        user_id: UserId,
        tracking_number: impl Into<String>,
        dropped_at: DateTime<Utc>,
    ) -> Result<Self, DropoffValidationError> {
        let tracking_number = normalize_tracking_number(&tracking_number.into())?;
        Ok(Self {
            id,
            user_id,
            tracking_number,
            dropped_at,
        })
    }

    pub fn validate(&self) -> Result<(), DropoffValidationError> {
        normalize_tracking_number(&self.tracking_number).map(|_| ())
    }
}

/// Trims and length-checks a raw tracking-number input.
pub fn normalize_tracking_number(raw: &str) -> Result<String, DropoffValidationError> {
    let trimmed = raw.trim();
    let chars = trimmed.chars().count();
    if !(TRACKING_NUMBER_MIN_CHARS..=TRACKING_NUMBER_MAX_CHARS).contains(&chars) {
        return Err(DropoffValidationError::InvalidTrackingNumber(
            raw.to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
