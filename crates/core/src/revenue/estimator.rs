//! Rate-based backfill of missing expense lines.

use driftline_shared::config::FinanceConfig;
use driftline_shared::types::apply_pct;
use rust_decimal::Decimal;

use super::types::NetRevenueResult;

/// Fills expense lines that no authoritative source populated, using the
/// operator's configured percentage rates.
pub struct ExpenseEstimator;

impl ExpenseEstimator {
    /// Backfills tax, insurance, equipment, and payment fee.
    ///
    /// Each line is touched only while its current value is zero or
    /// negative, which makes the whole function idempotent: callers
    /// re-derive results with the same settings on every request, and the
    /// second application must be a no-op. The payment fee combines the
    /// preferred fee entry's percentage with its fixed per-transaction
    /// component.
    pub fn apply_configured_rates(result: &mut NetRevenueResult, settings: &FinanceConfig) {
        if result.tax <= Decimal::ZERO {
            if let Some(rate) = settings.tax_rate_pct {
                result.tax = apply_pct(result.gross, rate);
            }
        }

        if result.insurance <= Decimal::ZERO {
            if let Some(rate) = settings.insurance_rate_pct {
                result.insurance = apply_pct(result.gross, rate);
            }
        }

        if result.equipment <= Decimal::ZERO {
            if let Some(rate) = settings.equipment_rate_pct {
                result.equipment = apply_pct(result.gross, rate);
            }
        }

        if result.payment_fee <= Decimal::ZERO {
            if let Some((pct, fixed)) = settings.preferred_payment_fee() {
                result.payment_fee = apply_pct(result.gross, pct)
                    + Decimal::from(result.transaction_count) * fixed;
            }
        }
    }
}
