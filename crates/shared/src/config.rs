//! Application configuration management.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Finance settings consumed by the revenue engine.
    #[serde(default)]
    pub finance: FinanceConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Finance settings: percentage rates used to estimate expense lines that
/// have no authoritative snapshot, and the per-method payment fee table.
///
/// Rates are percentages (`5` means 5%), not fractions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinanceConfig {
    /// Tax rate applied to gross revenue, in percent.
    #[serde(default)]
    pub tax_rate_pct: Option<Decimal>,
    /// Insurance rate applied to gross revenue, in percent.
    #[serde(default)]
    pub insurance_rate_pct: Option<Decimal>,
    /// Equipment cost rate applied to gross revenue, in percent.
    #[serde(default)]
    pub equipment_rate_pct: Option<Decimal>,
    /// Payment processing fees keyed by payment method name
    /// (e.g. "card", "pos", "online").
    #[serde(default)]
    pub payment_method_fees: BTreeMap<String, PaymentFeeConfig>,
}

/// A payment fee entry. Operators configure either a bare percentage or a
/// percentage plus a fixed per-transaction amount, so both shapes parse.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PaymentFeeConfig {
    /// Bare percentage, e.g. `card = 1.75`.
    Pct(Decimal),
    /// Percentage plus fixed per-transaction fee,
    /// e.g. `card = { pct = 1.75, fixed = 0.25 }`.
    Detailed {
        /// Percentage of the transaction amount.
        #[serde(default)]
        pct: Decimal,
        /// Fixed fee charged per transaction.
        #[serde(default)]
        fixed: Decimal,
    },
}

impl PaymentFeeConfig {
    /// Normalizes the entry to a `(pct, fixed)` pair.
    #[must_use]
    pub fn normalized(&self) -> (Decimal, Decimal) {
        match self {
            Self::Pct(pct) => (*pct, Decimal::ZERO),
            Self::Detailed { pct, fixed } => (*pct, *fixed),
        }
    }
}

impl FinanceConfig {
    /// Selects the preferred payment fee entry.
    ///
    /// Preference order: card > default > pos > online > stripe > terminal,
    /// then the alphabetically first remaining entry so the choice is
    /// deterministic when only unknown method names are configured.
    #[must_use]
    pub fn preferred_payment_fee(&self) -> Option<(Decimal, Decimal)> {
        const PREFERRED: [&str; 6] = ["card", "default", "pos", "online", "stripe", "terminal"];

        for name in PREFERRED {
            if let Some(entry) = self.payment_method_fees.get(name) {
                return Some(entry.normalized());
            }
        }

        // BTreeMap iterates in key order, so "first available" is stable.
        self.payment_method_fees
            .values()
            .next()
            .map(PaymentFeeConfig::normalized)
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DRIFTLINE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fees(entries: &[(&str, PaymentFeeConfig)]) -> FinanceConfig {
        FinanceConfig {
            payment_method_fees: entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
            ..FinanceConfig::default()
        }
    }

    #[test]
    fn test_fee_normalization_bare_pct() {
        let entry = PaymentFeeConfig::Pct(dec!(1.75));
        assert_eq!(entry.normalized(), (dec!(1.75), Decimal::ZERO));
    }

    #[test]
    fn test_fee_normalization_detailed() {
        let entry = PaymentFeeConfig::Detailed {
            pct: dec!(2.9),
            fixed: dec!(0.30),
        };
        assert_eq!(entry.normalized(), (dec!(2.9), dec!(0.30)));
    }

    #[test]
    fn test_preferred_fee_card_wins() {
        let config = fees(&[
            ("pos", PaymentFeeConfig::Pct(dec!(1.0))),
            ("card", PaymentFeeConfig::Pct(dec!(1.75))),
            ("stripe", PaymentFeeConfig::Pct(dec!(2.9))),
        ]);
        assert_eq!(
            config.preferred_payment_fee(),
            Some((dec!(1.75), Decimal::ZERO))
        );
    }

    #[test]
    fn test_preferred_fee_follows_order() {
        let config = fees(&[
            ("terminal", PaymentFeeConfig::Pct(dec!(0.5))),
            ("online", PaymentFeeConfig::Pct(dec!(2.0))),
        ]);
        assert_eq!(
            config.preferred_payment_fee(),
            Some((dec!(2.0), Decimal::ZERO))
        );
    }

    #[test]
    fn test_preferred_fee_falls_back_alphabetically() {
        let config = fees(&[
            ("wire", PaymentFeeConfig::Pct(dec!(0.1))),
            ("applepay", PaymentFeeConfig::Pct(dec!(1.5))),
        ]);
        assert_eq!(
            config.preferred_payment_fee(),
            Some((dec!(1.5), Decimal::ZERO))
        );
    }

    #[test]
    fn test_preferred_fee_empty_table() {
        let config = FinanceConfig::default();
        assert_eq!(config.preferred_payment_fee(), None);
    }
}
