//! Core domain logic for the package drop-off tracker.
//! This crate is the single source of truth for business invariants.
//!
//! All timestamps are stored UTC; the [`localtime`] module is the one place
//! they are projected into the configured display zone for day grouping and
//! date-range interpretation.

pub mod config;
pub mod db;
pub mod localtime;
pub mod logging;
pub mod model;
pub mod notify;
pub mod rates;
pub mod repo;
pub mod service;

pub use config::{CompanyInfo, Config, ConfigError};
pub use localtime::{
    bucket_by_local_day, DateRange, DayBucket, DisplayZone, TimeError, UtcWindow,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::dropoff::{Dropoff, DropoffId, DropoffValidationError};
pub use model::user::{User, UserId, UserValidationError};
pub use notify::{NotifyError, ReceiptNotifier};
pub use rates::{RateClient, RateError, RateEstimate, RateQuoteRequest};
pub use repo::dropoff_repo::{
    DropoffRepository, DropoffSearchFilter, DropoffWithOwner, SqliteDropoffRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountError, AccountService};
pub use service::dropoff_service::{
    Dashboard, DashboardDay, DropoffError, DropoffService, LocalDropoff, RangeSearch, Receipt,
};
pub use service::report_service::{ReportError, ReportService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
