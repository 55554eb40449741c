//! Transaction deletion with cascading cleanup.
//!
//! Deleting a financial transaction removes everything it funded. The
//! flow: discover dependents, let the caller review them (the conflict
//! gate), then execute the cascade, the reversal entry, and the wallet
//! recompute as one storage transaction. A per-customer advisory lock
//! serializes concurrent deletions for the same customer - the wallet is
//! the only shared resource, so the lock is scoped to it, not to the call.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use driftline_core::cascade::{
    CascadeError, CascadeOption, CascadePlan, CascadeStrategy, CascadeStrategyResolver,
    PackageCascadeState,
};
use driftline_core::package::{PackageUsage, PackageUsageExtractor};

use crate::entities::{
    bookings, customer_packages, rentals,
    sea_orm_active_enums::{RelatedEntityType, TransactionStatus, TransactionType},
    transactions, wallets,
};
use crate::repositories::dependency::{DependencyInspector, TransactionDependencies};
use crate::repositories::wallet::BalanceSyncEngine;

/// Options for a deletion request.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Execute the cascade instead of failing on dependents.
    pub force: bool,
    /// Delete permanently with no reversal entry. Reserved for cleaning up
    /// corrupted or duplicate data; skips the dependency gate entirely.
    pub hard_delete: bool,
    /// Per-package disposition selections.
    pub cascade: Vec<CascadeOption>,
    /// Reason recorded on the reversal entry.
    pub reason: Option<String>,
}

/// One package in a conflict payload, with its derived default strategy so
/// the caller can review before re-submitting with selections.
#[derive(Debug, Clone, Serialize)]
pub struct PackageDependency {
    /// The package row.
    pub package: customer_packages::Model,
    /// Normalized usage figures.
    pub usage: PackageUsage,
    /// The strategy the cascade would apply absent a selection.
    pub default_strategy: CascadeStrategy,
}

/// The full dependency set returned when a deletion is refused.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyConflict {
    /// The transaction that was asked to be deleted.
    pub transaction_id: Uuid,
    /// Bookings funded by the transaction.
    pub bookings: Vec<bookings::Model>,
    /// Packages funded by the transaction, with derived defaults.
    pub packages: Vec<PackageDependency>,
    /// Rentals funded by the transaction.
    pub rentals: Vec<rentals::Model>,
}

impl DependencyConflict {
    fn from_dependencies(deps: TransactionDependencies) -> Self {
        let packages = deps
            .packages
            .into_iter()
            .map(|package| {
                let usage = PackageUsageExtractor::extract_usage(&package.usage_record());
                let default_strategy = CascadeStrategyResolver::default_for(&usage);
                PackageDependency {
                    package,
                    usage,
                    default_strategy,
                }
            })
            .collect();

        Self {
            transaction_id: deps.transaction.id,
            bookings: deps.bookings,
            packages,
            rentals: deps.rentals,
        }
    }

    /// Number of dependent records across all three entity types.
    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.bookings.len() + self.packages.len() + self.rentals.len()
    }
}

/// A charge-used debit that was executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargedPackage {
    /// The charged package.
    pub package_id: Uuid,
    /// Debit amount taken from the wallet.
    pub debit: Decimal,
    /// The charge transaction that was created.
    pub charge_transaction_id: Uuid,
}

/// A charge-used debit that the negative-balance policy refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedCharge {
    /// The package whose charge was blocked.
    pub package_id: Uuid,
    /// Wallet balance at the time of the check.
    pub balance: Decimal,
    /// The debit that was attempted.
    pub debit: Decimal,
}

/// Lessons removed under one package's disposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageLessonsDeleted {
    /// The package whose lessons were removed.
    pub package_id: Uuid,
    /// The bookings that were deleted.
    pub booking_ids: Vec<Uuid>,
}

/// What one deletion actually did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletionReport {
    /// The transaction that was deleted.
    pub transaction_id: Uuid,
    /// True when the transaction was already gone - treated as resolved.
    pub already_deleted: bool,
    /// Bookings deleted directly.
    pub deleted_bookings: Vec<Uuid>,
    /// Packages charged for consumed hours.
    pub charged_packages: Vec<ChargedPackage>,
    /// Packages whose linked lessons were removed.
    pub lessons_deleted: Vec<PackageLessonsDeleted>,
    /// Rentals deleted.
    pub deleted_rentals: Vec<Uuid>,
    /// Charges refused by the negative-balance policy, named per package.
    pub blocked_charges: Vec<BlockedCharge>,
    /// The reversal entry, absent on hard deletes.
    pub reversal_transaction_id: Option<Uuid>,
    /// The wallet after resync.
    pub wallet: Option<wallets::Model>,
}

impl DeletionReport {
    fn already_deleted(transaction_id: Uuid) -> Self {
        Self {
            transaction_id,
            already_deleted: true,
            ..Self::default()
        }
    }
}

/// Errors from the deletion flow.
#[derive(Debug, Error)]
pub enum DeletionError {
    /// The transaction still has dependents and the caller did not force.
    /// Carries the full dependency set for review; nothing was mutated.
    #[error(
        "Transaction {} still funds {} dependent record(s)",
        .0.transaction_id,
        .0.dependent_count()
    )]
    DependencyConflict(Box<DependencyConflict>),

    /// A caller selection failed validation (e.g. unknown strategy).
    #[error(transparent)]
    Cascade(#[from] CascadeError),

    /// A persistence call failed; the storage transaction rolled back.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Receiver for best-effort side notifications when cascade deletions free
/// up scheduling slots or equipment. Not part of the atomicity guarantee.
pub trait SlotNotifier: Send + Sync {
    /// A booking was deleted; its slot is available again.
    fn booking_slot_released(&self, booking: &bookings::Model);
    /// A rental was deleted; the equipment is free again.
    fn equipment_freed(&self, rental: &rentals::Model);
}

/// Default notifier: logs the events for the scheduling consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSlotNotifier;

impl SlotNotifier for TracingSlotNotifier {
    fn booking_slot_released(&self, booking: &bookings::Model) {
        info!(
            booking_id = %booking.id,
            service = %booking.service_name,
            starts_at = %booking.starts_at,
            "slot released"
        );
    }

    fn equipment_freed(&self, rental: &rentals::Model) {
        info!(
            rental_id = %rental.id,
            equipment = %rental.equipment,
            "equipment freed"
        );
    }
}

/// Entity deletions queued for post-commit notification.
enum PendingNotification {
    Booking(bookings::Model),
    Rental(rentals::Model),
}

/// Orchestrates the full deletion flow for a financial transaction.
#[derive(Clone)]
pub struct TransactionDeletionCoordinator {
    db: DatabaseConnection,
    notifier: Arc<dyn SlotNotifier>,
}

impl TransactionDeletionCoordinator {
    /// Creates a coordinator with the default tracing notifier.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_notifier(db, Arc::new(TracingSlotNotifier))
    }

    /// Creates a coordinator with a custom notifier.
    #[must_use]
    pub fn with_notifier(db: DatabaseConnection, notifier: Arc<dyn SlotNotifier>) -> Self {
        Self { db, notifier }
    }

    /// Deletes a transaction together with everything it funded.
    ///
    /// Protocol:
    /// 1. A missing transaction is already resolved: logged, empty report.
    /// 2. `hard_delete` removes the row permanently with no reversal,
    ///    regardless of dependents (with `force` the cascade still runs;
    ///    only the reversal is suppressed).
    /// 3. Dependents without `force` refuse with the full dependency set.
    /// 4. `force` executes the cascade, the reversal (unless hard), the
    ///    row deletion, and the wallet recompute in one storage
    ///    transaction under a per-customer advisory lock.
    ///
    /// # Errors
    ///
    /// `DependencyConflict` at the review gate, `Cascade` for invalid
    /// selections, `Database` when persistence fails (everything rolls
    /// back).
    #[instrument(skip(self, options), fields(force = options.force, hard = options.hard_delete))]
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        options: DeleteOptions,
    ) -> Result<DeletionReport, DeletionError> {
        let Some(transaction) = transactions::Entity::find_by_id(transaction_id)
            .one(&self.db)
            .await?
        else {
            warn!(%transaction_id, "transaction already gone, nothing to delete");
            return Ok(DeletionReport::already_deleted(transaction_id));
        };

        let customer_id = transaction.customer_id;
        let deps = DependencyInspector::collect(&self.db, transaction).await?;

        if deps.has_dependencies() && !options.force && !options.hard_delete {
            return Err(DeletionError::DependencyConflict(Box::new(
                DependencyConflict::from_dependencies(deps),
            )));
        }

        // Validate selections and build the whole plan before any mutation.
        let plan = if options.force {
            CascadePlan::build(
                &deps.linked_bookings(),
                &deps.linked_packages(),
                &deps.linked_rentals(),
                &options.cascade,
            )?
        } else {
            CascadePlan::default()
        };

        match self
            .execute(transaction_id, customer_id, &plan, &options)
            .await
        {
            Ok((report, notifications)) => {
                for pending in notifications {
                    match pending {
                        PendingNotification::Booking(booking) => {
                            self.notifier.booking_slot_released(&booking);
                        }
                        PendingNotification::Rental(rental) => {
                            self.notifier.equipment_freed(&rental);
                        }
                    }
                }
                Ok(report)
            }
            Err(err) => {
                // The transaction rolled back, but leave the wallet row
                // consistent with whatever state the store is in now.
                if let Err(sync_err) = BalanceSyncEngine::resync_on(&self.db, customer_id).await {
                    warn!(%customer_id, error = %sync_err, "post-failure wallet resync failed");
                }
                Err(err)
            }
        }
    }

    /// Runs the mutation steps in one storage transaction.
    async fn execute(
        &self,
        transaction_id: Uuid,
        customer_id: Uuid,
        plan: &CascadePlan,
        options: &DeleteOptions,
    ) -> Result<(DeletionReport, Vec<PendingNotification>), DeletionError> {
        let txn = self.db.begin().await?;
        lock_customer(&txn, customer_id).await?;

        // Re-read under the lock: a concurrent deletion may have won.
        let Some(transaction) = transactions::Entity::find_by_id(transaction_id)
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            warn!(%transaction_id, "transaction deleted concurrently, nothing to do");
            return Ok((DeletionReport::already_deleted(transaction_id), Vec::new()));
        };

        let mut report = DeletionReport {
            transaction_id,
            ..DeletionReport::default()
        };
        let mut notifications = Vec::new();

        for booking_id in &plan.bookings_to_delete {
            if let Some(booking) = delete_booking(&txn, *booking_id).await? {
                report.deleted_bookings.push(booking.id);
                notifications.push(PendingNotification::Booking(booking));
            }
        }

        for action in &plan.package_actions {
            match action.strategy {
                CascadeStrategy::ChargeUsed => {
                    let Some(package) =
                        customer_packages::Entity::find_by_id(action.package_id)
                            .one(&txn)
                            .await?
                    else {
                        warn!(package_id = %action.package_id, "linked package already gone, skipping");
                        continue;
                    };

                    let balance =
                        BalanceSyncEngine::current_balance_on(&txn, customer_id).await?;
                    if let Err(CascadeError::NegativeBalanceBlocked {
                        package_id,
                        balance,
                        debit,
                    }) = CascadeStrategyResolver::ensure_chargeable(
                        package.id,
                        balance,
                        action.debit_amount,
                        action.allow_negative,
                    ) {
                        warn!(
                            %package_id,
                            %balance,
                            %debit,
                            "charge blocked by negative-balance policy"
                        );
                        report.blocked_charges.push(BlockedCharge {
                            package_id,
                            balance,
                            debit,
                        });
                        continue;
                    }

                    let state = PackageCascadeState::Pending.charge_used()?;
                    let charge = insert_charge(&txn, &package, action.debit_amount).await?;
                    state.finalize()?;

                    report.charged_packages.push(ChargedPackage {
                        package_id: package.id,
                        debit: action.debit_amount,
                        charge_transaction_id: charge.id,
                    });
                }
                CascadeStrategy::DeleteAllLessons => {
                    let state = PackageCascadeState::Pending.delete_lessons()?;
                    let mut removed = Vec::with_capacity(action.booking_ids.len());
                    for booking_id in &action.booking_ids {
                        if let Some(booking) = delete_booking(&txn, *booking_id).await? {
                            removed.push(booking.id);
                            notifications.push(PendingNotification::Booking(booking));
                        }
                    }
                    state.finalize()?;

                    report.lessons_deleted.push(PackageLessonsDeleted {
                        package_id: action.package_id,
                        booking_ids: removed,
                    });
                }
            }
        }

        for rental_id in &plan.rentals_to_delete {
            match rentals::Entity::find_by_id(*rental_id).one(&txn).await? {
                Some(rental) => {
                    rentals::Entity::delete_by_id(rental.id).exec(&txn).await?;
                    report.deleted_rentals.push(rental.id);
                    notifications.push(PendingNotification::Rental(rental));
                }
                None => {
                    warn!(%rental_id, "linked rental already gone, skipping");
                }
            }
        }

        if !options.hard_delete {
            let reversal = insert_reversal(&txn, &transaction, options.reason.clone()).await?;
            report.reversal_transaction_id = Some(reversal.id);
        }

        transactions::Entity::delete_by_id(transaction_id)
            .exec(&txn)
            .await?;

        let wallet = BalanceSyncEngine::resync_on(&txn, customer_id).await?;
        report.wallet = Some(wallet);

        txn.commit().await?;

        info!(
            %transaction_id,
            %customer_id,
            bookings = report.deleted_bookings.len(),
            charged = report.charged_packages.len(),
            rentals = report.deleted_rentals.len(),
            blocked = report.blocked_charges.len(),
            hard = options.hard_delete,
            "transaction deleted"
        );

        Ok((report, notifications))
    }
}

/// Serializes deletions per customer for the lifetime of the transaction.
async fn lock_customer(txn: &DatabaseTransaction, customer_id: Uuid) -> Result<(), DbErr> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtext($1))",
        [customer_id.to_string().into()],
    ))
    .await?;
    Ok(())
}

/// Deletes one booking; a missing row is logged and treated as resolved.
async fn delete_booking(
    txn: &DatabaseTransaction,
    booking_id: Uuid,
) -> Result<Option<bookings::Model>, DbErr> {
    match bookings::Entity::find_by_id(booking_id).one(txn).await? {
        Some(booking) => {
            bookings::Entity::delete_by_id(booking.id).exec(txn).await?;
            Ok(Some(booking))
        }
        None => {
            warn!(%booking_id, "linked booking already gone, skipping");
            Ok(None)
        }
    }
}

/// Emits the consumed-hours debit for a charged package.
async fn insert_charge(
    txn: &DatabaseTransaction,
    package: &customer_packages::Model,
    debit: Decimal,
) -> Result<transactions::Model, DbErr> {
    transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(package.customer_id),
        amount: Set(-debit),
        transaction_type: Set(TransactionType::Charge),
        related_entity_id: Set(Some(package.id)),
        related_entity_type: Set(Some(RelatedEntityType::Package)),
        status: Set(TransactionStatus::Completed),
        description: Set(format!(
            "Consumed hours on package {}",
            package.package_name
        )),
        reason: Set(None),
        reversal_of: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(txn)
    .await
}

/// Creates the same-magnitude, opposite-sign entry that offsets the
/// deleted transaction in the ledger, preserving audit history.
async fn insert_reversal(
    txn: &DatabaseTransaction,
    original: &transactions::Model,
    reason: Option<String>,
) -> Result<transactions::Model, DbErr> {
    transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(original.customer_id),
        amount: Set(-original.amount),
        transaction_type: Set(TransactionType::Reversal),
        related_entity_id: Set(original.related_entity_id),
        related_entity_type: Set(original.related_entity_type.clone()),
        status: Set(TransactionStatus::Completed),
        description: Set(format!("Reversal: {}", original.description)),
        reason: Set(reason),
        reversal_of: Set(Some(original.id)),
        created_at: Set(Utc::now().into()),
    }
    .insert(txn)
    .await
}
