//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and local-time projection into use-case
//!   level APIs.
//! - Keep delivery layers (web shell, CLI) decoupled from storage details.

pub mod account_service;
pub mod dropoff_service;
pub mod report_service;
