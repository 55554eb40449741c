//! Shared types, errors, and configuration for Driftline.
//!
//! This crate holds everything the other layers have in common:
//! configuration loading, the application-wide error taxonomy, and the
//! numeric coercion helpers used when consuming loosely-typed upstream data.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, FinanceConfig, PaymentFeeConfig};
pub use error::{AppError, AppResult};
