//! Initial database migration.
//!
//! Creates the voucher ledger schema: enums, tables, and the partial unique
//! indexes that back the engine's idempotency and exclusivity rules.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: VOUCHERS
        // ============================================================
        db.execute_unprepared(VOUCHERS_SQL).await?;

        // ============================================================
        // PART 3: APPLICATION (usages + allocation records)
        // ============================================================
        db.execute_unprepared(VOUCHER_USAGES_SQL).await?;
        db.execute_unprepared(ALLOCATION_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(ALLOCATION_LINES_SQL).await?;

        // ============================================================
        // PART 4: RETURN WORKFLOW
        // ============================================================
        db.execute_unprepared(RETURN_REQUESTS_SQL).await?;

        // ============================================================
        // PART 5: LEDGER JOURNAL
        // ============================================================
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Voucher lifecycle status
CREATE TYPE voucher_status AS ENUM (
    'active',
    'partial',
    'exhausted',
    'returned'
);

-- Usage row status
CREATE TYPE usage_status AS ENUM ('applied', 'reversed');

-- Return request review status
CREATE TYPE return_request_status AS ENUM (
    'pending',
    'approved',
    'rejected'
);

-- Ledger journal entry kind
CREATE TYPE ledger_entry_kind AS ENUM (
    'issued',
    'used',
    'returned',
    'reversed'
);

-- Allocation tier an amount was drawn under
CREATE TYPE allocation_tier AS ENUM (
    'project_scoped',
    'cost_centre_scoped',
    'unscoped'
);
";

const VOUCHERS_SQL: &str = r"
CREATE TABLE vouchers (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    employee_id UUID NOT NULL,
    code VARCHAR(64),
    currency VARCHAR(3) NOT NULL,
    total NUMERIC(19, 4) NOT NULL CHECK (total > 0),
    used NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (used >= 0),
    returned NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (returned >= 0),
    remaining NUMERIC(19, 4) NOT NULL CHECK (remaining >= 0),
    project_id UUID,
    cost_centre_id UUID,
    expires_at TIMESTAMPTZ,
    status voucher_status NOT NULL DEFAULT 'active',
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Conservation invariant, enforced at the storage boundary too
    CONSTRAINT vouchers_conservation CHECK (remaining = total - used - returned)
);

CREATE INDEX idx_vouchers_employee ON vouchers(employee_id, created_at);
CREATE INDEX idx_vouchers_company ON vouchers(company_id);
CREATE UNIQUE INDEX idx_vouchers_code ON vouchers(company_id, code) WHERE code IS NOT NULL;
";

const VOUCHER_USAGES_SQL: &str = r"
CREATE TABLE voucher_usages (
    id UUID PRIMARY KEY,
    voucher_id UUID NOT NULL REFERENCES vouchers(id),
    report_id UUID NOT NULL,
    employee_id UUID NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL,
    status usage_status NOT NULL DEFAULT 'applied',
    applied_by UUID NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL,
    reversed_by UUID,
    reversed_at TIMESTAMPTZ,
    reversal_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- At most one live application per (voucher, report) pair
CREATE UNIQUE INDEX idx_usages_live_pair
    ON voucher_usages(voucher_id, report_id)
    WHERE status = 'applied';

CREATE INDEX idx_usages_report ON voucher_usages(report_id);
CREATE INDEX idx_usages_voucher ON voucher_usages(voucher_id);
";

const ALLOCATION_TRANSACTIONS_SQL: &str = r"
CREATE TABLE allocation_transactions (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    employee_id UUID NOT NULL,
    report_id UUID NOT NULL,
    expense_id UUID,
    total NUMERIC(19, 4) NOT NULL CHECK (total > 0),
    currency VARCHAR(3) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- One funding record per expense line, or per report when the deduction
-- is report-level (NULL expense_id)
CREATE UNIQUE INDEX idx_allocations_expense
    ON allocation_transactions(report_id, expense_id)
    WHERE expense_id IS NOT NULL;
CREATE UNIQUE INDEX idx_allocations_report
    ON allocation_transactions(report_id)
    WHERE expense_id IS NULL;
";

const ALLOCATION_LINES_SQL: &str = r"
CREATE TABLE allocation_lines (
    id UUID PRIMARY KEY,
    allocation_id UUID NOT NULL REFERENCES allocation_transactions(id) ON DELETE CASCADE,
    voucher_id UUID NOT NULL REFERENCES vouchers(id),
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    tier allocation_tier NOT NULL,
    position INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT allocation_lines_position UNIQUE (allocation_id, position)
);

CREATE INDEX idx_allocation_lines_voucher ON allocation_lines(voucher_id);
";

const RETURN_REQUESTS_SQL: &str = r"
CREATE TABLE return_requests (
    id UUID PRIMARY KEY,
    voucher_id UUID NOT NULL REFERENCES vouchers(id),
    employee_id UUID NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL,
    status return_request_status NOT NULL DEFAULT 'pending',
    reason TEXT,
    requested_at TIMESTAMPTZ NOT NULL,
    decided_by UUID,
    decided_at TIMESTAMPTZ,
    decision_note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- At most one request awaiting review per voucher
CREATE UNIQUE INDEX idx_return_requests_pending
    ON return_requests(voucher_id)
    WHERE status = 'pending';

CREATE INDEX idx_return_requests_employee ON return_requests(employee_id);
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL,
    kind ledger_entry_kind NOT NULL,
    voucher_id UUID,
    report_id UUID,
    employee_id UUID NOT NULL,
    amount NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL,
    debit_account VARCHAR(64) NOT NULL,
    credit_account VARCHAR(64) NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(64),
    entry_date DATE NOT NULL,
    financial_year VARCHAR(9) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_ledger_voucher ON ledger_entries(voucher_id) WHERE voucher_id IS NOT NULL;
CREATE INDEX idx_ledger_report ON ledger_entries(report_id) WHERE report_id IS NOT NULL;
CREATE INDEX idx_ledger_company_date ON ledger_entries(company_id, entry_date);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS return_requests CASCADE;
DROP TABLE IF EXISTS allocation_lines CASCADE;
DROP TABLE IF EXISTS allocation_transactions CASCADE;
DROP TABLE IF EXISTS voucher_usages CASCADE;
DROP TABLE IF EXISTS vouchers CASCADE;

DROP TYPE IF EXISTS allocation_tier;
DROP TYPE IF EXISTS ledger_entry_kind;
DROP TYPE IF EXISTS return_request_status;
DROP TYPE IF EXISTS usage_status;
DROP TYPE IF EXISTS voucher_status;
";
