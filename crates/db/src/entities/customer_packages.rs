//! `SeaORM` Entity for the customer_packages table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PackageStatus;
use driftline_core::package::PackageRecord;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_packages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub package_name: String,
    /// Typed hour columns are optional: rows imported from the legacy
    /// system may only carry the usage_summary blob.
    pub total_hours: Option<Decimal>,
    pub used_hours: Option<Decimal>,
    pub remaining_hours: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub currency: String,
    pub status: PackageStatus,
    /// Legacy usage summary blob (mixed camelCase/snake_case keys).
    pub usage_summary: Option<Json>,
    /// Transaction that paid for this package, if any.
    pub payment_transaction_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Builds the raw record the usage extractor consumes.
    #[must_use]
    pub fn usage_record(&self) -> PackageRecord {
        PackageRecord {
            total_hours: self.total_hours,
            used_hours: self.used_hours,
            remaining_hours: self.remaining_hours,
            purchase_price: self.purchase_price,
            usage_summary: self.usage_summary.clone(),
        }
    }
}
