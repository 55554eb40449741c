//! Cascade error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::strategy::PackageCascadeState;

/// Errors that can occur while resolving or executing a cascade.
#[derive(Debug, Error)]
pub enum CascadeError {
    /// Caller supplied a strategy value that is not one of the known
    /// dispositions. Rejected outright; a deletion never proceeds on an
    /// ambiguous strategy.
    #[error("Unknown cascade strategy: {0:?}")]
    InvalidStrategy(String),

    /// Attempted an invalid package state transition within a cascade.
    #[error("Invalid cascade transition from {from} to {to}")]
    InvalidTransition {
        /// The current state.
        from: PackageCascadeState,
        /// The attempted target state.
        to: PackageCascadeState,
    },

    /// Charging the consumed hours would push the wallet negative and the
    /// caller forbade that. Reported per package; the rest of the cascade
    /// continues.
    #[error(
        "Charging package {package_id} would overdraw the wallet: balance {balance}, debit {debit}"
    )]
    NegativeBalanceBlocked {
        /// The package whose charge was blocked.
        package_id: Uuid,
        /// Wallet balance at the time of the check.
        balance: Decimal,
        /// The debit that was attempted.
        debit: Decimal,
    },
}
