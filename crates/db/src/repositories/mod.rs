//! Repository abstractions for data access.

pub mod dependency;
pub mod deletion;
pub mod revenue;
pub mod wallet;

pub use dependency::{DependencyInspector, TransactionDependencies};
pub use deletion::{
    DeleteOptions, DeletionError, DeletionReport, SlotNotifier, TracingSlotNotifier,
    TransactionDeletionCoordinator,
};
pub use revenue::{PeriodFilter, RevenueRepository};
pub use wallet::BalanceSyncEngine;
