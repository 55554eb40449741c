//! Wallet balance synchronization.
//!
//! The wallet row is a derived figure: the signed sum of the customer's
//! remaining transactions. Nothing edits it in place - after any mutation
//! of the transaction set, the engine recomputes it from the rows that are
//! actually there, which makes the operation idempotent and keeps a single
//! writer for `current_balance`.

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{
    sea_orm_active_enums::{TransactionStatus, TransactionType},
    transactions, wallets,
};

/// Recomputes a customer's wallet from their remaining transactions.
#[derive(Debug, Clone)]
pub struct BalanceSyncEngine {
    db: DatabaseConnection,
}

/// Derived wallet figures before persistence.
struct WalletFigures {
    current_balance: Decimal,
    lifetime_value: Decimal,
    last_payment_date: Option<DateTime<FixedOffset>>,
}

impl BalanceSyncEngine {
    /// Creates a new balance sync engine.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recomputes and persists the wallet for a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn resync(&self, customer_id: Uuid) -> Result<wallets::Model, DbErr> {
        Self::resync_on(&self.db, customer_id).await
    }

    /// Recomputes and persists the wallet on an arbitrary connection, so
    /// the cascade coordinator can run it inside its storage transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn resync_on<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
    ) -> Result<wallets::Model, DbErr> {
        let figures = Self::compute(conn, customer_id).await?;

        debug!(
            %customer_id,
            balance = %figures.current_balance,
            lifetime = %figures.lifetime_value,
            "wallet resynced"
        );

        let now = Utc::now().into();
        match wallets::Entity::find_by_id(customer_id).one(conn).await? {
            Some(wallet) => {
                let mut active: wallets::ActiveModel = wallet.into();
                active.current_balance = Set(figures.current_balance);
                active.lifetime_value = Set(figures.lifetime_value);
                active.last_payment_date = Set(figures.last_payment_date);
                active.updated_at = Set(now);
                active.update(conn).await
            }
            None => {
                wallets::ActiveModel {
                    customer_id: Set(customer_id),
                    current_balance: Set(figures.current_balance),
                    lifetime_value: Set(figures.lifetime_value),
                    last_payment_date: Set(figures.last_payment_date),
                    updated_at: Set(now),
                }
                .insert(conn)
                .await
            }
        }
    }

    /// The customer's balance as derived from the transaction rows,
    /// without touching the wallet row. The cascade coordinator uses this
    /// to evaluate the negative-balance policy mid-transaction, where its
    /// own uncommitted debits must already count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current_balance_on<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
    ) -> Result<Decimal, DbErr> {
        Ok(Self::compute(conn, customer_id).await?.current_balance)
    }

    async fn compute<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
    ) -> Result<WalletFigures, DbErr> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::CustomerId.eq(customer_id))
            .filter(transactions::Column::Status.ne(TransactionStatus::Cancelled))
            .all(conn)
            .await?;

        let current_balance: Decimal = rows.iter().map(|t| t.amount).sum();

        let payments: Vec<&transactions::Model> = rows
            .iter()
            .filter(|t| {
                t.transaction_type == TransactionType::Payment
                    && t.status == TransactionStatus::Completed
                    && t.amount > Decimal::ZERO
            })
            .collect();

        let lifetime_value = payments.iter().map(|t| t.amount).sum();
        let last_payment_date = payments.iter().map(|t| t.created_at).max();

        Ok(WalletFigures {
            current_balance,
            lifetime_value,
            last_payment_date,
        })
    }
}
