//! Initial database migration.
//!
//! Creates the core tables: customers, transactions, bookings,
//! customer_packages, rentals, wallets, and service_ledger_snapshots.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(CUSTOMER_PACKAGES_SQL).await?;
        db.execute_unprepared(BOOKINGS_SQL).await?;
        db.execute_unprepared(RENTALS_SQL).await?;
        db.execute_unprepared(WALLETS_SQL).await?;
        db.execute_unprepared(SERVICE_LEDGER_SNAPSHOTS_SQL).await?;
        db.execute_unprepared(INDEXES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r"
            DROP TABLE IF EXISTS service_ledger_snapshots;
            DROP TABLE IF EXISTS wallets;
            DROP TABLE IF EXISTS rentals;
            DROP TABLE IF EXISTS bookings;
            DROP TABLE IF EXISTS customer_packages;
            DROP TABLE IF EXISTS transactions;
            DROP TABLE IF EXISTS customers;
            ",
        )
        .await?;

        Ok(())
    }
}

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY,
    full_name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    phone VARCHAR(32),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id),
    amount DECIMAL(19, 4) NOT NULL,
    transaction_type VARCHAR(16) NOT NULL
        CHECK (transaction_type IN ('payment', 'refund', 'charge', 'reversal', 'adjustment')),
    related_entity_id UUID,
    related_entity_type VARCHAR(16)
        CHECK (related_entity_type IN ('booking', 'package', 'rental')),
    status VARCHAR(16) NOT NULL
        CHECK (status IN ('pending', 'completed', 'cancelled')),
    description VARCHAR(512) NOT NULL,
    reason VARCHAR(512),
    reversal_of UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const CUSTOMER_PACKAGES_SQL: &str = r"
CREATE TABLE customer_packages (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id),
    package_name VARCHAR(255) NOT NULL,
    total_hours DECIMAL(10, 2),
    used_hours DECIMAL(10, 2),
    remaining_hours DECIMAL(10, 2),
    purchase_price DECIMAL(19, 4),
    currency VARCHAR(3) NOT NULL DEFAULT 'EUR',
    status VARCHAR(16) NOT NULL
        CHECK (status IN ('active', 'exhausted', 'expired')),
    usage_summary JSONB,
    payment_transaction_id UUID REFERENCES transactions(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const BOOKINGS_SQL: &str = r"
CREATE TABLE bookings (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id),
    service_name VARCHAR(255) NOT NULL,
    starts_at TIMESTAMPTZ NOT NULL,
    duration_hours DECIMAL(10, 2) NOT NULL DEFAULT 1,
    status VARCHAR(16) NOT NULL
        CHECK (status IN ('scheduled', 'completed', 'cancelled', 'no_show')),
    package_id UUID REFERENCES customer_packages(id) ON DELETE SET NULL,
    payment_transaction_id UUID REFERENCES transactions(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const RENTALS_SQL: &str = r"
CREATE TABLE rentals (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id),
    equipment VARCHAR(255) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    total_price DECIMAL(19, 4) NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'EUR',
    status VARCHAR(16) NOT NULL
        CHECK (status IN ('reserved', 'out', 'returned', 'cancelled')),
    payment_transaction_id UUID REFERENCES transactions(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const WALLETS_SQL: &str = r"
CREATE TABLE wallets (
    customer_id UUID PRIMARY KEY REFERENCES customers(id),
    current_balance DECIMAL(19, 4) NOT NULL DEFAULT 0,
    lifetime_value DECIMAL(19, 4) NOT NULL DEFAULT 0,
    last_payment_date TIMESTAMPTZ,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const SERVICE_LEDGER_SNAPSHOTS_SQL: &str = r"
CREATE TABLE service_ledger_snapshots (
    id UUID PRIMARY KEY,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    service_type VARCHAR(64),
    gross_total DECIMAL(19, 4) NOT NULL DEFAULT 0,
    net_total DECIMAL(19, 4) NOT NULL DEFAULT 0,
    commission_total DECIMAL(19, 4) NOT NULL DEFAULT 0,
    commission_rate DECIMAL(8, 4) NOT NULL DEFAULT 0,
    refunded_total DECIMAL(19, 4) NOT NULL DEFAULT 0,
    items_count BIGINT NOT NULL DEFAULT 0,
    expected_by_service JSONB,
    generated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const INDEXES_SQL: &str = r"
CREATE INDEX idx_transactions_customer ON transactions(customer_id);
CREATE INDEX idx_transactions_related ON transactions(related_entity_id)
    WHERE related_entity_id IS NOT NULL;
CREATE INDEX idx_transactions_created_at ON transactions(created_at);
CREATE INDEX idx_bookings_customer ON bookings(customer_id);
CREATE INDEX idx_bookings_payment_txn ON bookings(payment_transaction_id)
    WHERE payment_transaction_id IS NOT NULL;
CREATE INDEX idx_bookings_package ON bookings(package_id)
    WHERE package_id IS NOT NULL;
CREATE INDEX idx_packages_customer ON customer_packages(customer_id);
CREATE INDEX idx_packages_payment_txn ON customer_packages(payment_transaction_id)
    WHERE payment_transaction_id IS NOT NULL;
CREATE INDEX idx_rentals_customer ON rentals(customer_id);
CREATE INDEX idx_rentals_payment_txn ON rentals(payment_transaction_id)
    WHERE payment_transaction_id IS NOT NULL;
CREATE INDEX idx_snapshots_period ON service_ledger_snapshots(period_start, period_end);
";
