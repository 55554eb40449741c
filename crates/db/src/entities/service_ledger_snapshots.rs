//! `SeaORM` Entity for the service_ledger_snapshots table.
//!
//! Precomputed accrual records produced by the external reporting job.
//! This system only reads them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_ledger_snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub period_start: Date,
    pub period_end: Date,
    /// Service the snapshot covers; NULL means all services.
    pub service_type: Option<String>,
    pub gross_total: Decimal,
    pub net_total: Decimal,
    pub commission_total: Decimal,
    pub commission_rate: Decimal,
    pub refunded_total: Decimal,
    pub items_count: i64,
    /// Expected revenue per service name, as written by the reporting job.
    pub expected_by_service: Option<Json>,
    pub generated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
