//! Ledger journal repository.
//!
//! Append-only: exposes insert and queries, never updates or deletes. The
//! journal explains balances after the fact and is never consulted by
//! mutation logic.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use advara_core::journal::JournalEntryInput;
use advara_shared::types::{CompanyId, ReportId, VoucherId};

use crate::entities::ledger_entries;

use super::RepoError;

/// A stored journal row.
pub type LedgerEntry = ledger_entries::Model;

/// Date-range filter for company journal queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerFilter {
    /// Earliest entry date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest entry date, inclusive.
    pub to: Option<NaiveDate>,
}

/// Ledger journal repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends one journal entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append(&self, entry: &JournalEntryInput) -> Result<LedgerEntry, RepoError> {
        Self::append_on(&self.db, entry).await
    }

    /// Appends one journal entry on an arbitrary connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append_on<C: ConnectionTrait>(
        conn: &C,
        entry: &JournalEntryInput,
    ) -> Result<LedgerEntry, RepoError> {
        let model = ledger_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(entry.company_id.into_inner()),
            kind: Set(entry.kind.into()),
            voucher_id: Set(entry.voucher_id.map(VoucherId::into_inner)),
            report_id: Set(entry.report_id.map(ReportId::into_inner)),
            employee_id: Set(entry.employee_id.into_inner()),
            amount: Set(entry.amount),
            currency: Set(entry.currency.to_string()),
            debit_account: Set(entry.debit_account.clone()),
            credit_account: Set(entry.credit_account.clone()),
            description: Set(entry.description.clone()),
            reference: Set(entry.reference.clone()),
            entry_date: Set(entry.entry_date),
            financial_year: Set(entry.financial_year.clone()),
            created_at: Set(Utc::now().into()),
        };

        Ok(model.insert(conn).await?)
    }

    /// Lists entries for one voucher, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn by_voucher(&self, voucher_id: VoucherId) -> Result<Vec<LedgerEntry>, RepoError> {
        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::VoucherId.eq(voucher_id.into_inner()))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Lists entries for one report, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn by_report(&self, report_id: ReportId) -> Result<Vec<LedgerEntry>, RepoError> {
        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::ReportId.eq(report_id.into_inner()))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Lists a company's entries within an optional date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn for_company(
        &self,
        company_id: CompanyId,
        filter: LedgerFilter,
    ) -> Result<Vec<LedgerEntry>, RepoError> {
        let mut query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::CompanyId.eq(company_id.into_inner()));

        if let Some(from) = filter.from {
            query = query.filter(ledger_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(ledger_entries::Column::EntryDate.lte(to));
        }

        let entries = query
            .order_by_asc(ledger_entries::Column::EntryDate)
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(entries)
    }
}
