//! Process configuration loaded from the environment.
//!
//! # Responsibility
//! - Collect every tunable (database path, display zone, company identity,
//!   delivery webhook, carrier-rate credentials) in one explicit object.
//!
//! # Invariants
//! - The display zone and bcrypt cost are validated at load time; services
//!   never re-validate them.
//! - Secrets stay `Option`s; absent integrations degrade to no-ops instead
//!   of failing the boot.

use crate::localtime::DisplayZone;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Company identity stamped onto receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidZone(String),
    InvalidBcryptCost(u32),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidZone(name) => write!(f, "DROPTRACK_TZ is not a known zone: `{name}`"),
            Self::InvalidBcryptCost(cost) => {
                write!(f, "BCRYPT_COST {cost} is outside the accepted 4-16 window")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: String,

    // Presentation
    pub display_zone: DisplayZone,
    pub company: CompanyInfo,

    // Logging
    pub log_level: String,
    pub log_dir: String,

    // Accounts
    pub bcrypt_cost: u32,

    // Receipt delivery
    pub receipt_webhook_url: Option<String>,

    // Carrier rates
    pub rates_base_url: String,
    pub rates_api_key: Option<String>,
    pub rates_api_secret: Option<String>,
}

fn env_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|x| x.trim().parse().ok())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_path = env_string("DROPTRACK_DB_PATH", "./droptrack.db");

        let zone_name = env_string("DROPTRACK_TZ", "America/Los_Angeles");
        let display_zone =
            DisplayZone::new(&zone_name).map_err(|_| ConfigError::InvalidZone(zone_name))?;

        let company = CompanyInfo {
            name: env_string("COMPANY_NAME", "MAIL+PC"),
            address: env_string(
                "COMPANY_ADDRESS",
                "310 E Orangethorpe Ave Ste M Placentia CA 92870",
            ),
        };

        let log_level = env_string("DROPTRACK_LOG_LEVEL", crate::logging::default_log_level());
        let log_dir = env_string("DROPTRACK_LOG_DIR", "./logs");

        let bcrypt_cost = env_parse::<u32>("BCRYPT_COST").unwrap_or(bcrypt::DEFAULT_COST);
        if !(4..=16).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(bcrypt_cost));
        }

        let receipt_webhook_url = env_optional("RECEIPT_WEBHOOK_URL");

        let rates_base_url = env_string("RATES_BASE_URL", "https://ssapi.shipstation.com");
        let rates_api_key = env_optional("RATES_API_KEY");
        let rates_api_secret = env_optional("RATES_API_SECRET");

        Ok(Self {
            database_path,
            display_zone,
            company,
            log_level,
            log_dir,
            bcrypt_cost,
            receipt_webhook_url,
            rates_base_url,
            rates_api_key,
            rates_api_secret,
        })
    }
}
