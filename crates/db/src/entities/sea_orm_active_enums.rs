//! Database enums shared across entities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Financial transaction type.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Customer payment (credits the wallet).
    #[sea_orm(string_value = "payment")]
    Payment,
    /// Refund issued to the customer.
    #[sea_orm(string_value = "refund")]
    Refund,
    /// Charge against the wallet (debits it).
    #[sea_orm(string_value = "charge")]
    Charge,
    /// Offsetting entry created when a transaction is deleted.
    #[sea_orm(string_value = "reversal")]
    Reversal,
    /// Manual correction entry.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

/// Financial transaction status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Awaiting settlement.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled before settlement.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Type of the entity a transaction directly funded.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RelatedEntityType {
    /// A lesson booking.
    #[sea_orm(string_value = "booking")]
    Booking,
    /// A customer hour package.
    #[sea_orm(string_value = "package")]
    Package,
    /// An equipment rental.
    #[sea_orm(string_value = "rental")]
    Rental,
}

/// Lesson booking status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Booked, not yet held.
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Held as planned.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Cancelled in advance.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Customer did not show up.
    #[sea_orm(string_value = "no_show")]
    NoShow,
}

/// Customer package status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    /// Hours remain.
    #[sea_orm(string_value = "active")]
    Active,
    /// All hours consumed.
    #[sea_orm(string_value = "exhausted")]
    Exhausted,
    /// Validity window elapsed.
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// Equipment rental status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    /// Reserved, equipment not yet handed over.
    #[sea_orm(string_value = "reserved")]
    Reserved,
    /// Equipment is with the customer.
    #[sea_orm(string_value = "out")]
    Out,
    /// Equipment returned.
    #[sea_orm(string_value = "returned")]
    Returned,
    /// Reservation cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}
