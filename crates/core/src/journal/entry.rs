//! Ledger journal entry construction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use advara_shared::types::{CompanyId, EmployeeId, ReportId, VoucherId};
use advara_shared::types::money::Currency;

use super::fiscal::financial_year;
use crate::voucher::Voucher;

/// The kind of balance-changing event a journal row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    /// A voucher was issued to an employee.
    Issued,
    /// Voucher balance was drawn against an expense report.
    Used,
    /// Unused balance was handed back.
    Returned,
    /// A prior usage was undone after report rejection.
    Reversed,
}

impl LedgerEntryKind {
    /// The (debit, credit) account tags for this event kind.
    ///
    /// Issuance moves cash into the employee-advance asset; usage expenses
    /// it; a return or a reversal each walk one leg back.
    #[must_use]
    pub const fn account_tags(&self) -> (&'static str, &'static str) {
        match self {
            Self::Issued => ("employee_advances", "cash"),
            Self::Used => ("expenses", "employee_advances"),
            Self::Returned => ("cash", "employee_advances"),
            Self::Reversed => ("employee_advances", "expenses"),
        }
    }

    /// Stable lowercase name, as stored in the journal.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Used => "used",
            Self::Returned => "returned",
            Self::Reversed => "reversed",
        }
    }
}

/// A fully described journal row, ready to append.
///
/// Immutable once written; the store never updates or deletes these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Event kind.
    pub kind: LedgerEntryKind,
    /// The voucher involved, if any.
    pub voucher_id: Option<VoucherId>,
    /// The report involved, if any.
    pub report_id: Option<ReportId>,
    /// The employee whose balance moved.
    pub employee_id: EmployeeId,
    /// Event amount. Always positive; direction comes from the account tags.
    pub amount: Decimal,
    /// Event currency.
    pub currency: Currency,
    /// Debit account tag.
    pub debit_account: String,
    /// Credit account tag.
    pub credit_account: String,
    /// Human description.
    pub description: String,
    /// External reference (e.g., the voucher code).
    pub reference: Option<String>,
    /// Date of the event.
    pub entry_date: NaiveDate,
    /// Derived reporting bucket (April-March fiscal year).
    pub financial_year: String,
}

impl JournalEntryInput {
    /// Builds a journal row for a balance event on `voucher`.
    ///
    /// Account tags and the financial-year bucket are derived here so no
    /// call site can get them wrong.
    #[must_use]
    pub fn for_voucher(
        kind: LedgerEntryKind,
        voucher: &Voucher,
        report_id: Option<ReportId>,
        amount: Decimal,
        description: String,
        entry_date: NaiveDate,
    ) -> Self {
        let (debit_account, credit_account) = kind.account_tags();
        Self {
            company_id: voucher.company_id,
            kind,
            voucher_id: Some(voucher.id),
            report_id,
            employee_id: voucher.employee_id,
            amount,
            currency: voucher.currency,
            debit_account: debit_account.to_string(),
            credit_account: credit_account.to_string(),
            description,
            reference: voucher.code.clone(),
            entry_date,
            financial_year: financial_year(entry_date),
        }
    }
}
