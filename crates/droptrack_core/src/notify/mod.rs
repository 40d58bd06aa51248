//! Receipt delivery.
//!
//! # Responsibility
//! - Post assembled receipt data as JSON to the configured delivery
//!   webhook (the mail gateway sitting in front of the store's inbox).
//!
//! # Invariants
//! - An unset webhook URL makes delivery a no-op, never an error.
//! - Receipt data is sent as-is; rendering stays with the receiver.

use crate::service::dropoff_service::Receipt;
use reqwest::blocking::Client;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum NotifyError {
    /// Transport failure reaching the webhook.
    Http(reqwest::Error),
    /// The webhook answered with a non-success status.
    Rejected(u16),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "receipt delivery failed: {err}"),
            Self::Rejected(status) => {
                write!(f, "receipt delivery rejected with status {status}")
            }
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Rejected(_) => None,
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Serialize)]
struct ReceiptPayload<'a> {
    recipient: &'a str,
    subject: String,
    receipt: &'a Receipt,
}

#[derive(Clone)]
pub struct ReceiptNotifier {
    webhook_url: Option<String>,
    http: Client,
}

impl ReceiptNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            webhook_url,
            http: Client::new(),
        }
    }

    /// Delivers one receipt to the recipient address via the webhook.
    pub fn deliver(&self, recipient: &str, receipt: &Receipt) -> Result<(), NotifyError> {
        let Some(url) = self.webhook_url.as_deref() else {
            // Dev/test environments run without a delivery gateway.
            return Ok(());
        };

        let payload = ReceiptPayload {
            recipient,
            subject: format!(
                "Package Drop-off Receipt - {} ({} items)",
                receipt.receipt_date, receipt.total_packages
            ),
            receipt,
        };

        let resp = self.http.post(url).json(&payload).send()?;
        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(resp.status().as_u16()));
        }
        Ok(())
    }
}
