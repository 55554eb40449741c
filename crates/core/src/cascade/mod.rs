//! Cascade strategies and planning for transaction deletion.
//!
//! Deleting a financial transaction takes everything it funded with it:
//! lesson bookings, package entitlements, equipment rentals. This module
//! holds the pure half of that flow - which disposition each package gets,
//! the per-package state machine, and the plan derived from a dependency
//! set plus caller selections. Execution against storage lives in the db
//! layer.

pub mod error;
pub mod plan;
pub mod strategy;

pub use error::CascadeError;
pub use plan::{CascadePlan, LinkedBooking, LinkedPackage, LinkedRental, PackageAction};
pub use strategy::{
    CascadeOption, CascadeStrategy, CascadeStrategyResolver, PackageCascadeState, ResolvedStrategy,
};
