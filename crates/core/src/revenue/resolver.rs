//! Ordered resolution of the canonical net revenue figure.

use driftline_shared::config::FinanceConfig;
use rust_decimal::Decimal;

use super::estimator::ExpenseEstimator;
use super::types::{NetRevenueResult, RevenueSources};

/// Produces one canonical net revenue result from the available sources.
///
/// Precedence: ledger snapshot, then per-service aggregate, then raw
/// transaction sums. A source is skipped when it yields nothing usable
/// (absent, or zero/negative activity), and the next one takes over.
pub struct LedgerResolver;

impl LedgerResolver {
    /// Resolves net revenue for one period/service filter.
    ///
    /// Whatever source wins, the expense estimator then backfills the
    /// expense lines the source did not carry, and `net` is recomputed
    /// from scratch as the final step so the reported figure is always
    /// internally consistent with its own components.
    #[must_use]
    pub fn resolve_net_revenue(
        sources: &RevenueSources,
        settings: &FinanceConfig,
    ) -> NetRevenueResult {
        let mut result = Self::base_result(sources);

        ExpenseEstimator::apply_configured_rates(&mut result, settings);
        result.finalize();

        result
    }

    /// Picks the winning source and seeds gross/commission/refunds from it.
    fn base_result(sources: &RevenueSources) -> NetRevenueResult {
        if let Some(snapshot) = sources.snapshot.as_ref().filter(|s| s.is_usable()) {
            return NetRevenueResult {
                gross: snapshot.gross_total,
                refunded: snapshot.refunded_total,
                commission: snapshot.commission_total,
                transaction_count: snapshot.items_count,
                supported: true,
                ..NetRevenueResult::default()
            };
        }

        let service = sources.service_type.as_deref();
        if let Some(aggregate) = sources
            .aggregate
            .as_ref()
            .filter(|a| a.gross_for(service) > Decimal::ZERO)
        {
            return NetRevenueResult {
                gross: aggregate.gross_for(service),
                refunded: sources.raw.refunded_total,
                commission: aggregate.commission_total,
                transaction_count: sources.raw.transaction_count,
                supported: false,
                ..NetRevenueResult::default()
            };
        }

        NetRevenueResult {
            gross: sources.raw.completed_total,
            refunded: sources.raw.refunded_total,
            transaction_count: sources.raw.transaction_count,
            supported: false,
            ..NetRevenueResult::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revenue::types::{LedgerAggregate, RawTransactionTotals, SnapshotTotals};
    use driftline_shared::config::PaymentFeeConfig;
    use rust_decimal_macros::dec;

    fn settings() -> FinanceConfig {
        let mut config = FinanceConfig {
            tax_rate_pct: Some(dec!(10)),
            insurance_rate_pct: Some(dec!(2)),
            equipment_rate_pct: None,
            ..FinanceConfig::default()
        };
        config
            .payment_method_fees
            .insert("card".to_string(), PaymentFeeConfig::Pct(dec!(2)));
        config
    }

    fn raw(completed: Decimal, refunded: Decimal, count: u64) -> RawTransactionTotals {
        RawTransactionTotals {
            completed_total: completed,
            refunded_total: refunded,
            transaction_count: count,
        }
    }

    #[test]
    fn test_snapshot_wins_and_net_is_recomputed() {
        let sources = RevenueSources {
            snapshot: Some(SnapshotTotals {
                gross_total: dec!(500),
                net_total: dec!(450), // stale upstream figure, must be ignored
                commission_total: dec!(50),
                commission_rate: dec!(10),
                refunded_total: dec!(20),
                items_count: 5,
            }),
            aggregate: None,
            raw: raw(dec!(9999), dec!(9999), 99),
            service_type: None,
        };

        let result = LedgerResolver::resolve_net_revenue(&sources, &settings());

        assert!(result.supported);
        assert_eq!(result.gross, dec!(500));
        assert_eq!(result.commission, dec!(50));
        // tax 10% = 50, insurance 2% = 10, fee 2% = 10
        assert_eq!(result.tax, dec!(50));
        assert_eq!(result.insurance, dec!(10));
        assert_eq!(result.payment_fee, dec!(10));
        // 500 - 20 - 50 - 50 - 10 - 0 - 10, never the snapshot's net_total
        assert_eq!(result.net, dec!(360));
        assert_eq!(result.commission_rate, dec!(10));
        assert!(!result.anomalous);
    }

    #[test]
    fn test_empty_snapshot_falls_through_to_aggregate() {
        let mut by_service = std::collections::BTreeMap::new();
        by_service.insert("lesson".to_string(), dec!(300));
        by_service.insert("rental".to_string(), dec!(100));

        let sources = RevenueSources {
            snapshot: Some(SnapshotTotals::default()),
            aggregate: Some(LedgerAggregate {
                expected_total: dec!(400),
                expected_by_service: by_service,
                commission_total: dec!(40),
            }),
            raw: raw(dec!(1234), dec!(10), 7),
            service_type: Some("lesson".to_string()),
        };

        let result = LedgerResolver::resolve_net_revenue(&sources, &settings());

        assert!(!result.supported);
        assert_eq!(result.gross, dec!(300));
        assert_eq!(result.commission, dec!(40));
        assert_eq!(result.refunded, dec!(10));
        assert_eq!(result.transaction_count, 7);
    }

    #[test]
    fn test_aggregate_without_service_uses_expected_total() {
        let sources = RevenueSources {
            snapshot: None,
            aggregate: Some(LedgerAggregate {
                expected_total: dec!(400),
                expected_by_service: std::collections::BTreeMap::new(),
                commission_total: dec!(40),
            }),
            raw: raw(dec!(1234), dec!(0), 7),
            service_type: None,
        };

        let result = LedgerResolver::resolve_net_revenue(&sources, &settings());
        assert_eq!(result.gross, dec!(400));
    }

    #[test]
    fn test_raw_fallback_when_nothing_else_usable() {
        let sources = RevenueSources {
            snapshot: None,
            aggregate: Some(LedgerAggregate::default()),
            raw: raw(dec!(250), dec!(30), 3),
            service_type: None,
        };

        let result = LedgerResolver::resolve_net_revenue(&sources, &settings());

        assert!(!result.supported);
        assert_eq!(result.gross, dec!(250));
        assert_eq!(result.commission, Decimal::ZERO);
        // 250 - 30 - 0 - 25 - 5 - 0 - 5
        assert_eq!(result.net, dec!(185));
    }

    #[test]
    fn test_commission_rate_zero_gross_guard() {
        let sources = RevenueSources {
            raw: raw(Decimal::ZERO, Decimal::ZERO, 0),
            ..RevenueSources::default()
        };

        let result = LedgerResolver::resolve_net_revenue(&sources, &FinanceConfig::default());

        assert_eq!(result.commission_rate, Decimal::ZERO);
        assert_eq!(result.net, Decimal::ZERO);
        assert!(!result.anomalous);
    }

    #[test]
    fn test_refunds_exceeding_gross_flagged_not_clamped() {
        let sources = RevenueSources {
            raw: raw(dec!(100), dec!(150), 2),
            ..RevenueSources::default()
        };

        let result = LedgerResolver::resolve_net_revenue(&sources, &FinanceConfig::default());

        assert_eq!(result.net, dec!(-50));
        assert!(result.anomalous);
    }

    #[test]
    fn test_negative_gross_passes_through() {
        let sources = RevenueSources {
            raw: raw(dec!(-80), dec!(0), 1),
            ..RevenueSources::default()
        };

        let result = LedgerResolver::resolve_net_revenue(&sources, &FinanceConfig::default());

        assert_eq!(result.gross, dec!(-80));
        assert_eq!(result.net, dec!(-80));
        assert!(result.anomalous);
    }

    #[test]
    fn test_resolution_is_stable_under_reapplication() {
        let sources = RevenueSources {
            snapshot: Some(SnapshotTotals {
                gross_total: dec!(500),
                net_total: dec!(450),
                commission_total: dec!(50),
                commission_rate: dec!(10),
                refunded_total: dec!(20),
                items_count: 5,
            }),
            ..RevenueSources::default()
        };

        let mut result = LedgerResolver::resolve_net_revenue(&sources, &settings());
        let first = result.clone();
        ExpenseEstimator::apply_configured_rates(&mut result, &settings());
        result.finalize();

        assert_eq!(result, first);
    }
}
