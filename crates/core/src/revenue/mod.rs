//! Net revenue resolution.
//!
//! Revenue figures for a period can come from three places, in strictly
//! decreasing trust: precomputed ledger snapshots, per-service ledger
//! aggregates, and raw transaction sums. This module owns that precedence
//! chain and the rate-based backfill of expense lines, so the rule is
//! defined exactly once and is testable in isolation.

pub mod estimator;
pub mod resolver;
pub mod types;

pub use estimator::ExpenseEstimator;
pub use resolver::LedgerResolver;
pub use types::{LedgerAggregate, NetRevenueResult, RawTransactionTotals, RevenueSources, SnapshotTotals};
