//! Dependency discovery for transaction deletion.
//!
//! A transaction can fund entities through two linkage paths: its own
//! `related_entity_id`/`related_entity_type` pointer, and the reverse
//! `payment_transaction_id` column on bookings, packages, and rentals.
//! Both paths are unioned in a single OR filter per entity, which also
//! collapses the redundant matches a doubly-linked row would produce.

use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use driftline_core::cascade::{LinkedBooking, LinkedPackage, LinkedRental};
use driftline_core::package::PackageUsageExtractor;

use crate::entities::{
    bookings, customer_packages, rentals, sea_orm_active_enums::RelatedEntityType, transactions,
};

/// Everything a transaction funds, plus the transaction itself.
#[derive(Debug, Clone)]
pub struct TransactionDependencies {
    /// The transaction under inspection.
    pub transaction: transactions::Model,
    /// Bookings funded by the transaction.
    pub bookings: Vec<bookings::Model>,
    /// Packages funded by the transaction.
    pub packages: Vec<customer_packages::Model>,
    /// Rentals funded by the transaction.
    pub rentals: Vec<rentals::Model>,
}

impl TransactionDependencies {
    /// True when anything depends on the transaction.
    #[must_use]
    pub fn has_dependencies(&self) -> bool {
        !self.bookings.is_empty() || !self.packages.is_empty() || !self.rentals.is_empty()
    }

    /// Bookings in the shape the cascade planner consumes.
    #[must_use]
    pub fn linked_bookings(&self) -> Vec<LinkedBooking> {
        self.bookings
            .iter()
            .map(|b| LinkedBooking {
                id: b.id,
                package_id: b.package_id,
            })
            .collect()
    }

    /// Packages with normalized usage, in planner shape.
    #[must_use]
    pub fn linked_packages(&self) -> Vec<LinkedPackage> {
        self.packages
            .iter()
            .map(|p| LinkedPackage {
                id: p.id,
                usage: PackageUsageExtractor::extract_usage(&p.usage_record()),
            })
            .collect()
    }

    /// Rentals in planner shape.
    #[must_use]
    pub fn linked_rentals(&self) -> Vec<LinkedRental> {
        self.rentals
            .iter()
            .map(|r| LinkedRental { id: r.id })
            .collect()
    }
}

/// Read-only discovery of everything a transaction funds.
#[derive(Debug, Clone)]
pub struct DependencyInspector {
    db: DatabaseConnection,
}

impl DependencyInspector {
    /// Creates a new dependency inspector.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the dependency set for a transaction.
    ///
    /// Returns `None` when the transaction does not exist. Performs no
    /// mutation; storage errors propagate to the caller as retryable.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn find_dependencies(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<TransactionDependencies>, DbErr> {
        let Some(transaction) = transactions::Entity::find_by_id(transaction_id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(Self::collect(&self.db, transaction).await?))
    }

    /// Collects the dependency set on an arbitrary connection. The
    /// deletion coordinator reuses this inside its storage transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn collect<C: ConnectionTrait>(
        conn: &C,
        transaction: transactions::Model,
    ) -> Result<TransactionDependencies, DbErr> {
        let related = |kind: RelatedEntityType| -> Option<Uuid> {
            (transaction.related_entity_type.as_ref() == Some(&kind))
                .then_some(transaction.related_entity_id)
                .flatten()
        };

        let mut booking_filter =
            Condition::any().add(bookings::Column::PaymentTransactionId.eq(transaction.id));
        if let Some(id) = related(RelatedEntityType::Booking) {
            booking_filter = booking_filter.add(bookings::Column::Id.eq(id));
        }
        let found_bookings = bookings::Entity::find()
            .filter(booking_filter)
            .all(conn)
            .await?;

        let mut package_filter = Condition::any()
            .add(customer_packages::Column::PaymentTransactionId.eq(transaction.id));
        if let Some(id) = related(RelatedEntityType::Package) {
            package_filter = package_filter.add(customer_packages::Column::Id.eq(id));
        }
        let found_packages = customer_packages::Entity::find()
            .filter(package_filter)
            .all(conn)
            .await?;

        let mut rental_filter =
            Condition::any().add(rentals::Column::PaymentTransactionId.eq(transaction.id));
        if let Some(id) = related(RelatedEntityType::Rental) {
            rental_filter = rental_filter.add(rentals::Column::Id.eq(id));
        }
        let found_rentals = rentals::Entity::find()
            .filter(rental_filter)
            .all(conn)
            .await?;

        Ok(TransactionDependencies {
            transaction,
            bookings: found_bookings,
            packages: found_packages,
            rentals: found_rentals,
        })
    }
}
