//! Account use-case service.
//!
//! # Responsibility
//! - Registration, credential verification and the admin account
//!   operations (password reset, admin toggle, delete).
//!
//! # Invariants
//! - Raw passwords never reach the repository; only bcrypt hashes do.
//! - Credential failures are indistinguishable to callers (unknown phone
//!   and wrong password both yield `InvalidCredentials`).
//! - Admin operations never apply to the acting admin's own account where
//!   that would lock them out (admin toggle, delete).

use crate::model::user::{normalize_phone, User, UserId, UserValidationError};
use crate::repo::user_repo::UserRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountError {
    /// The phone number already identifies an account.
    PhoneAlreadyRegistered(String),
    /// Password input is empty or whitespace.
    EmptyPassword,
    /// Unknown phone number or wrong password.
    InvalidCredentials,
    /// Target account does not exist.
    UserNotFound(UserId),
    /// Acting user lacks the admin flag.
    NotAuthorized,
    /// Admin operation aimed at the acting admin's own account.
    SelfTarget(&'static str),
    /// Account field validation failure.
    Validation(UserValidationError),
    /// bcrypt hashing/verification failure.
    PasswordHash(bcrypt::BcryptError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PhoneAlreadyRegistered(phone) => {
                write!(f, "phone number already registered: {phone}")
            }
            Self::EmptyPassword => write!(f, "password cannot be empty"),
            Self::InvalidCredentials => write!(f, "invalid phone number or password"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::NotAuthorized => write!(f, "administrative access required"),
            Self::SelfTarget(operation) => {
                write!(f, "cannot apply {operation} to your own account")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::PasswordHash(err) => write!(f, "password hashing failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent account state: {details}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::PasswordHash(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::UserValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<UserValidationError> for AccountError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<bcrypt::BcryptError> for AccountError {
    fn from(value: bcrypt::BcryptError) -> Self {
        Self::PasswordHash(value)
    }
}

/// Account service facade over a user repository.
pub struct AccountService<R: UserRepository> {
    repo: R,
    bcrypt_cost: u32,
}

impl<R: UserRepository> AccountService<R> {
    /// Creates a service hashing with the bcrypt default cost.
    pub fn new(repo: R) -> Self {
        Self::with_cost(repo, bcrypt::DEFAULT_COST)
    }

    /// Creates a service with an explicit bcrypt cost (tests use low cost).
    pub fn with_cost(repo: R, bcrypt_cost: u32) -> Self {
        Self { repo, bcrypt_cost }
    }

    /// Registers a new account from raw phone/password input.
    ///
    /// Rejects empty passwords, malformed phone numbers and phone numbers
    /// that already identify an account.
    pub fn register(&self, phone_number: &str, password: &str) -> Result<User, AccountError> {
        if password.trim().is_empty() {
            return Err(AccountError::EmptyPassword);
        }
        let phone = normalize_phone(phone_number)?;

        if self.repo.find_by_phone(&phone)?.is_some() {
            return Err(AccountError::PhoneAlreadyRegistered(phone));
        }

        let password_hash = bcrypt::hash(password, self.bcrypt_cost)?;
        let user = User::new(phone, password_hash)?;
        let id = self.repo.create_user(&user)?;

        info!("event=account_register module=account status=ok user={id}");
        self.read_back(id, "registered account not found in read-back")
    }

    /// Verifies raw login input against the stored hash.
    pub fn verify_credentials(
        &self,
        phone_number: &str,
        password: &str,
    ) -> Result<User, AccountError> {
        let Ok(phone) = normalize_phone(phone_number) else {
            return Err(AccountError::InvalidCredentials);
        };
        let Some(user) = self.repo.find_by_phone(&phone)? else {
            return Err(AccountError::InvalidCredentials);
        };

        if !bcrypt::verify(password, &user.password_hash)? {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Admin: replaces the target account's password.
    pub fn reset_password(
        &self,
        acting: &User,
        target: UserId,
        new_password: &str,
    ) -> Result<(), AccountError> {
        require_admin(acting)?;
        if new_password.trim().is_empty() {
            return Err(AccountError::EmptyPassword);
        }

        let password_hash = bcrypt::hash(new_password, self.bcrypt_cost)?;
        self.repo.set_password_hash(target, &password_hash)?;
        info!(
            "event=account_password_reset module=account status=ok admin={} user={target}",
            acting.id
        );
        Ok(())
    }

    /// Admin: flips the target account's admin flag. Never on self.
    pub fn toggle_admin(&self, acting: &User, target: UserId) -> Result<User, AccountError> {
        require_admin(acting)?;
        if acting.id == target {
            return Err(AccountError::SelfTarget("an admin-status change"));
        }

        let current = self
            .repo
            .get_user(target)?
            .ok_or(AccountError::UserNotFound(target))?;
        self.repo.set_admin(target, !current.is_admin)?;
        info!(
            "event=account_toggle_admin module=account status=ok admin={} user={target} is_admin={}",
            acting.id, !current.is_admin
        );
        self.read_back(target, "toggled account not found in read-back")
    }

    /// Admin: deletes the target account and all its drop-offs. Never on
    /// self.
    pub fn delete_user(&self, acting: &User, target: UserId) -> Result<(), AccountError> {
        require_admin(acting)?;
        if acting.id == target {
            return Err(AccountError::SelfTarget("account deletion"));
        }

        self.repo.delete_user_with_dropoffs(target)?;
        info!(
            "event=account_delete module=account status=ok admin={} user={target}",
            acting.id
        );
        Ok(())
    }

    /// Admin: lists all accounts, newest registration first.
    pub fn list_users(&self, acting: &User) -> Result<Vec<User>, AccountError> {
        require_admin(acting)?;
        Ok(self.repo.list_users()?)
    }

    /// Gets one account by id.
    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo.get_user(id)
    }

    fn read_back(&self, id: UserId, details: &'static str) -> Result<User, AccountError> {
        self.repo
            .get_user(id)?
            .ok_or(AccountError::InconsistentState(details))
    }
}

fn require_admin(acting: &User) -> Result<(), AccountError> {
    if acting.is_admin {
        Ok(())
    } else {
        Err(AccountError::NotAuthorized)
    }
}
