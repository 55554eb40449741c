//! Revenue domain types.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The canonical net revenue figure for a period and service filter.
///
/// `net` is always recomputed from the other fields as the final resolution
/// step; it is never copied verbatim from an upstream record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetRevenueResult {
    /// Gross revenue for the filter. Unclamped: refunds can legitimately
    /// drive this negative in reconciliation data.
    pub gross: Decimal,
    /// Total refunded amount.
    pub refunded: Decimal,
    /// Commission paid to the platform/marketplace.
    pub commission: Decimal,
    /// Tax expense line.
    pub tax: Decimal,
    /// Insurance expense line.
    pub insurance: Decimal,
    /// Equipment cost expense line.
    pub equipment: Decimal,
    /// Payment processing fee.
    pub payment_fee: Decimal,
    /// Effective commission rate in percent (0 when gross is 0).
    pub commission_rate: Decimal,
    /// Net revenue: gross minus refunds and every expense line.
    pub net: Decimal,
    /// Number of transactions behind the gross figure.
    pub transaction_count: u64,
    /// True when the figure is backed by an authoritative ledger snapshot.
    pub supported: bool,
    /// True when the arithmetic produced an implausible shape
    /// (negative net, or refunds exceeding gross). The values are still
    /// reported unclamped; this flag is the caller's cue to surface them.
    pub anomalous: bool,
}

impl NetRevenueResult {
    /// Recomputes the derived fields from the primary ones.
    ///
    /// Net is `gross - refunded - commission - tax - insurance - equipment
    /// - payment_fee`; the commission rate is derived with a zero-gross
    /// guard. Safe to call any number of times.
    pub fn finalize(&mut self) {
        self.commission_rate = if self.gross == Decimal::ZERO {
            Decimal::ZERO
        } else {
            self.commission / self.gross * Decimal::ONE_HUNDRED
        };

        self.net = self.gross
            - self.refunded
            - self.commission
            - self.tax
            - self.insurance
            - self.equipment
            - self.payment_fee;

        self.anomalous = self.net < Decimal::ZERO || self.refunded > self.gross;
    }
}

/// A precomputed accrual record for one period/service, produced by the
/// external reporting job. This system only reads these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTotals {
    /// Expected gross revenue for the period.
    pub gross_total: Decimal,
    /// Net total as computed by the reporting job. Kept for comparison;
    /// resolution recomputes net instead of trusting this.
    pub net_total: Decimal,
    /// Commission total for the period.
    pub commission_total: Decimal,
    /// Commission rate recorded by the reporting job, in percent.
    pub commission_rate: Decimal,
    /// Refunded total for the period.
    pub refunded_total: Decimal,
    /// Number of items behind the snapshot.
    pub items_count: u64,
}

impl SnapshotTotals {
    /// A snapshot is usable when it actually recorded activity.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.gross_total > Decimal::ZERO || self.items_count > 0
    }
}

/// Per-service expected-revenue aggregate, the second-choice source when no
/// snapshot covers the period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAggregate {
    /// Expected revenue across all services.
    pub expected_total: Decimal,
    /// Expected revenue broken down by service name.
    pub expected_by_service: BTreeMap<String, Decimal>,
    /// Commission total across the period.
    pub commission_total: Decimal,
}

impl LedgerAggregate {
    /// Gross figure for the given service filter: the single service's
    /// expected amount when one is named, otherwise the overall total.
    #[must_use]
    pub fn gross_for(&self, service_type: Option<&str>) -> Decimal {
        match service_type {
            Some(service) => self
                .expected_by_service
                .get(service)
                .copied()
                .unwrap_or(Decimal::ZERO),
            None => self.expected_total,
        }
    }
}

/// Sums over the raw transaction rows matching the filter. Always present;
/// the last-resort source and the refund/count authority for the fallback
/// paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransactionTotals {
    /// Sum of completed payment amounts.
    pub completed_total: Decimal,
    /// Sum of refund amounts (positive magnitude).
    pub refunded_total: Decimal,
    /// Number of completed payment transactions.
    pub transaction_count: u64,
}

/// Everything the resolver needs for one period/service filter.
#[derive(Debug, Clone, Default)]
pub struct RevenueSources {
    /// Snapshot covering the period, when the reporting job produced one.
    pub snapshot: Option<SnapshotTotals>,
    /// Per-service aggregate, when available.
    pub aggregate: Option<LedgerAggregate>,
    /// Raw transaction sums for the filter.
    pub raw: RawTransactionTotals,
    /// Service filter; `None` means all services.
    pub service_type: Option<String>,
}
