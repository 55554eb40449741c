//! `SeaORM` entity definitions.

pub mod bookings;
pub mod customer_packages;
pub mod customers;
pub mod rentals;
pub mod sea_orm_active_enums;
pub mod service_ledger_snapshots;
pub mod transactions;
pub mod wallets;
