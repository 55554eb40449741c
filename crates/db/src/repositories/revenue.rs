//! Revenue source loading.
//!
//! Gathers the three inputs the core resolver ranks - the ledger snapshot
//! covering the period, the aggregate derived from overlapping snapshot
//! rows, and the raw transaction sums - and delegates the precedence
//! decision to `LedgerResolver`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use driftline_core::revenue::{
    LedgerAggregate, LedgerResolver, NetRevenueResult, RawTransactionTotals, RevenueSources,
    SnapshotTotals,
};
use driftline_shared::config::FinanceConfig;
use driftline_shared::types::coerce_decimal;

use crate::entities::{
    sea_orm_active_enums::{TransactionStatus, TransactionType},
    service_ledger_snapshots, transactions,
};

/// Inclusive date range for a revenue query.
#[derive(Debug, Clone, Copy)]
pub struct PeriodFilter {
    /// First day of the period.
    pub from: NaiveDate,
    /// Last day of the period.
    pub to: NaiveDate,
}

/// Loads revenue sources and resolves the canonical net figure.
#[derive(Debug, Clone)]
pub struct RevenueRepository {
    db: DatabaseConnection,
}

impl RevenueRepository {
    /// Creates a new revenue repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolves net revenue for a period and optional service filter.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn resolve_net_revenue(
        &self,
        period: PeriodFilter,
        service_type: Option<String>,
        settings: &FinanceConfig,
    ) -> Result<NetRevenueResult, DbErr> {
        let snapshot = self.load_snapshot(period, service_type.as_deref()).await?;
        let aggregate = self.load_aggregate(period).await?;
        let raw = self.load_raw_totals(period).await?;

        let sources = RevenueSources {
            snapshot,
            aggregate,
            raw,
            service_type,
        };

        Ok(LedgerResolver::resolve_net_revenue(&sources, settings))
    }

    /// The snapshot whose period exactly matches the filter, preferring
    /// the most recently generated one when the reporting job reran.
    async fn load_snapshot(
        &self,
        period: PeriodFilter,
        service_type: Option<&str>,
    ) -> Result<Option<SnapshotTotals>, DbErr> {
        let mut query = service_ledger_snapshots::Entity::find()
            .filter(service_ledger_snapshots::Column::PeriodStart.eq(period.from))
            .filter(service_ledger_snapshots::Column::PeriodEnd.eq(period.to));

        query = match service_type {
            Some(service) => {
                query.filter(service_ledger_snapshots::Column::ServiceType.eq(service))
            }
            None => query.filter(service_ledger_snapshots::Column::ServiceType.is_null()),
        };

        let row = query
            .order_by_desc(service_ledger_snapshots::Column::GeneratedAt)
            .one(&self.db)
            .await?;

        Ok(row.map(|s| SnapshotTotals {
            gross_total: s.gross_total,
            net_total: s.net_total,
            commission_total: s.commission_total,
            commission_rate: s.commission_rate,
            refunded_total: s.refunded_total,
            items_count: u64::try_from(s.items_count).unwrap_or(0),
        }))
    }

    /// Aggregate across every snapshot row overlapping the period. Used
    /// when no single snapshot covers the filter exactly.
    async fn load_aggregate(&self, period: PeriodFilter) -> Result<Option<LedgerAggregate>, DbErr> {
        let rows = service_ledger_snapshots::Entity::find()
            .filter(service_ledger_snapshots::Column::PeriodStart.lte(period.to))
            .filter(service_ledger_snapshots::Column::PeriodEnd.gte(period.from))
            .all(&self.db)
            .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut expected_total = Decimal::ZERO;
        let mut commission_total = Decimal::ZERO;
        let mut expected_by_service: BTreeMap<String, Decimal> = BTreeMap::new();

        for row in rows {
            expected_total += row.gross_total;
            commission_total += row.commission_total;

            if let Some(by_service) = row.expected_by_service.as_ref().and_then(|v| v.as_object())
            {
                for (service, amount) in by_service {
                    *expected_by_service.entry(service.clone()).or_default() +=
                        coerce_decimal(amount);
                }
            } else if let Some(service) = row.service_type {
                *expected_by_service.entry(service).or_default() += row.gross_total;
            }
        }

        Ok(Some(LedgerAggregate {
            expected_total,
            expected_by_service,
            commission_total,
        }))
    }

    /// Sums over the raw transaction rows in the period: completed payment
    /// totals and counts, plus refund magnitudes.
    async fn load_raw_totals(&self, period: PeriodFilter) -> Result<RawTransactionTotals, DbErr> {
        let from = period.from.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
        let to_exclusive = period
            .to
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed));
        if let Some(from) = from {
            query = query.filter(transactions::Column::CreatedAt.gte(from));
        }
        if let Some(to) = to_exclusive {
            query = query.filter(transactions::Column::CreatedAt.lt(to));
        }

        let rows = query.all(&self.db).await?;

        let mut totals = RawTransactionTotals::default();
        for row in &rows {
            match row.transaction_type {
                TransactionType::Payment => {
                    totals.completed_total += row.amount;
                    totals.transaction_count += 1;
                }
                TransactionType::Refund => {
                    totals.refunded_total += row.amount.abs();
                }
                _ => {}
            }
        }

        Ok(totals)
    }
}
