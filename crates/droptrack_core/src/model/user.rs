//! User account model.
//!
//! # Responsibility
//! - Define the account record shared by login, admin and reporting paths.
//! - Normalize and validate phone-number identities.
//!
//! # Invariants
//! - `phone_number` is stored normalized (digits, optional leading `+`) and
//!   is unique per account.
//! - `password_hash` only ever holds a bcrypt hash, never a raw password.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a user account.
pub type UserId = Uuid;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid phone regex"));

/// Validation error for account fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Phone number does not normalize to 7-15 digits (optional `+` prefix).
    InvalidPhoneNumber(String),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPhoneNumber(value) => {
                write!(f, "invalid phone number: `{value}`")
            }
        }
    }
}

impl Error for UserValidationError {}

/// Account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID used for scoping drop-off records.
    pub id: UserId,
    /// Normalized phone-number identity.
    pub phone_number: String,
    /// bcrypt hash of the account password.
    pub password_hash: String,
    /// Registration instant, UTC.
    pub created_at: DateTime<Utc>,
    /// Grants access to the admin operations.
    pub is_admin: bool,
}

impl User {
    /// Creates an account with a generated id and `created_at = now`.
    pub fn new(
        phone_number: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        Self::with_id(Uuid::new_v4(), phone_number, password_hash, Utc::now())
    }

    /// Creates an account with caller-provided identity and timestamp.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(
        id: UserId,
        phone_number: impl Into<String>,
        password_hash: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserValidationError> {
        let phone_number = normalize_phone(&phone_number.into())?;
        Ok(Self {
            id,
            phone_number,
            password_hash: password_hash.into(),
            created_at,
            is_admin: false,
        })
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        if !PHONE_RE.is_match(&self.phone_number) {
            return Err(UserValidationError::InvalidPhoneNumber(
                self.phone_number.clone(),
            ));
        }
        Ok(())
    }
}

/// Normalizes a raw phone input: separators stripped, shape enforced.
pub fn normalize_phone(raw: &str) -> Result<String, UserValidationError> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    if PHONE_RE.is_match(&compact) {
        Ok(compact)
    } else {
        Err(UserValidationError::InvalidPhoneNumber(raw.to_string()))
    }
}
