//! Carrier-rate quote client.
//!
//! # Responsibility
//! - Forward a rate request to the carrier API (`/shipments/getrates`) with
//!   HTTP Basic credentials and reduce the response to a single estimate.
//!
//! # Invariants
//! - The first rate in the carrier's response wins; the raw rate is kept
//!   alongside the reduced numbers.
//! - `total_fee = shipment_cost + other_cost`.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum RateError {
    /// Credentials were not configured.
    MissingCredentials,
    /// Transport or non-2xx response from the carrier API.
    Http(reqwest::Error),
    /// The carrier returned an empty rate list.
    NoRates,
}

impl Display for RateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => {
                write!(f, "carrier-rate credentials are not configured")
            }
            Self::Http(err) => write!(f, "carrier-rate request failed: {err}"),
            Self::NoRates => write!(f, "carrier returned no rates for the shipment"),
        }
    }
}

impl Error for RateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RateError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateAddress {
    pub name: String,
    pub street1: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "postalCode")]
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub residential: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateWeight {
    pub value: f64,
    /// Carrier default unit.
    pub units: String,
}

impl RateWeight {
    pub fn pounds(value: f64) -> Self {
        Self {
            value,
            units: "pounds".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub units: String,
}

impl RateDimensions {
    pub fn inches(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
            units: "inches".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatePackage {
    pub weight: RateWeight,
    pub dimensions: RateDimensions,
    #[serde(rename = "packageType")]
    pub package_type: String,
    #[serde(rename = "insuredValue")]
    pub insured_value: f64,
    pub contents: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateQuoteRequest {
    #[serde(rename = "carrierCode")]
    pub carrier_code: String,
    #[serde(rename = "serviceCode")]
    pub service_code: String,
    #[serde(rename = "fromAddress")]
    pub from_address: RateAddress,
    #[serde(rename = "toAddress")]
    pub to_address: RateAddress,
    pub package: RatePackage,
    #[serde(rename = "testMode")]
    pub test_mode: bool,
}

/// One carrier rate; unknown fields are kept as JSON for forward-compat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateQuote {
    #[serde(rename = "shipmentCost")]
    pub shipment_cost: f64,
    #[serde(rename = "otherCost", default)]
    pub other_cost: f64,
    #[serde(flatten)]
    pub rest: serde_json::Value,
}

/// Reduced estimate handed back to callers.
#[derive(Debug, Clone, Serialize)]
pub struct RateEstimate {
    pub total_fee: f64,
    pub shipment_cost: f64,
    pub other_cost: f64,
    pub detail: RateQuote,
}

#[derive(Clone)]
pub struct RateClient {
    base_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    http: Client,
}

impl RateClient {
    pub fn new(base_url: String, api_key: Option<String>, api_secret: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            http: Client::new(),
        }
    }

    /// Requests rates for one shipment and reduces to the first offer.
    pub fn quote(&self, request: &RateQuoteRequest) -> Result<RateEstimate, RateError> {
        let key = self.api_key.as_deref().ok_or(RateError::MissingCredentials)?;
        let secret = self
            .api_secret
            .as_deref()
            .ok_or(RateError::MissingCredentials)?;

        let url = format!("{}/shipments/getrates", self.base_url);
        let rates: Vec<RateQuote> = self
            .http
            .post(url)
            .basic_auth(key, Some(secret))
            .json(request)
            .send()?
            .error_for_status()?
            .json()?;

        let first = rates.into_iter().next().ok_or(RateError::NoRates)?;
        Ok(RateEstimate {
            total_fee: first.shipment_cost + first.other_cost,
            shipment_cost: first.shipment_cost,
            other_cost: first.other_cost,
            detail: first,
        })
    }
}
