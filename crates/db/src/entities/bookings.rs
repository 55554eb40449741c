//! `SeaORM` Entity for the bookings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::BookingStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_name: String,
    pub starts_at: DateTimeWithTimeZone,
    pub duration_hours: Decimal,
    pub status: BookingStatus,
    /// Package the booking consumes hours from, if any.
    pub package_id: Option<Uuid>,
    /// Transaction that paid for this booking, if any.
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
    #[sea_orm(
        belongs_to = "super::customer_packages::Entity",
        from = "Column::PackageId",
        to = "super::customer_packages::Column::Id"
    )]
    CustomerPackages,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::customer_packages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerPackages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
