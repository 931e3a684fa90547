//! Application domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use advara_shared::types::{
    AllocationId, CompanyId, CostCentreId, EmployeeId, ExpenseId, ProjectId, ReportId, UsageId,
    VoucherId,
};
use advara_shared::types::money::Currency;

use crate::allocation::AllocationLine;
use crate::journal::JournalEntryInput;
use crate::voucher::{Voucher, VoucherError};

/// The slice of an expense report this engine needs to see.
///
/// The report lifecycle itself is an external driver; it hands the engine
/// this snapshot at the call boundary. Reports are not persisted here.
#[derive(Debug, Clone, Copy)]
pub struct ReportSnapshot {
    /// Report identifier.
    pub id: ReportId,
    /// The employee who owns the report.
    pub owner_id: EmployeeId,
    /// True while the report is in its pre-finalization editable state.
    pub editable: bool,
    /// Project scope of the report's spend, if any.
    pub project_id: Option<ProjectId>,
    /// Cost-centre scope of the report's spend, if any.
    pub cost_centre_id: Option<CostCentreId>,
}

/// Status of one voucher usage row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    /// The usage currently funds its report.
    Applied,
    /// The usage was undone after report rejection.
    Reversed,
}

/// One instance of a voucher being drawn against one report.
///
/// At most one non-reversed usage exists per (voucher, report) pair.
/// Created by the Application Service, transitioned to REVERSED only by the
/// Reversal Service, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherUsage {
    /// Unique identifier.
    pub id: UsageId,
    /// The voucher drawn from.
    pub voucher_id: VoucherId,
    /// The report funded.
    pub report_id: ReportId,
    /// The employee on both sides of the draw.
    pub employee_id: EmployeeId,
    /// Amount drawn.
    pub amount: Decimal,
    /// Currency of the draw.
    pub currency: Currency,
    /// Applied or reversed.
    pub status: UsageStatus,
    /// Who applied it.
    pub applied_by: EmployeeId,
    /// When it was applied.
    pub applied_at: DateTime<Utc>,
    /// Who reversed it, once reversed.
    pub reversed_by: Option<EmployeeId>,
    /// When it was reversed.
    pub reversed_at: Option<DateTime<Utc>>,
    /// Why it was reversed.
    pub reversal_reason: Option<String>,
}

impl VoucherUsage {
    /// Returns true if this usage still funds its report.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.status == UsageStatus::Applied
    }
}

/// Everything a single apply produces, to be committed atomically.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// The voucher with post-apply balances and status.
    pub voucher: Voucher,
    /// The new usage row.
    pub usage: VoucherUsage,
    /// The "used" journal row (appended best-effort after commit).
    pub journal: JournalEntryInput,
}

/// The record of exactly which vouchers funded one application.
///
/// Doubles as the idempotency key: at most one transaction exists per
/// report, or per (report, expense) when deduction is expense-level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTransaction {
    /// Unique identifier.
    pub id: AllocationId,
    /// Owning company.
    pub company_id: CompanyId,
    /// The funded employee.
    pub employee_id: EmployeeId,
    /// The funded report.
    pub report_id: ReportId,
    /// The funded expense line, when deduction is expense-level.
    pub expense_id: Option<ExpenseId>,
    /// Total funded amount. Always equals the sum of the lines.
    pub total: Decimal,
    /// Currency of the funding.
    pub currency: Currency,
    /// Ordered `{voucher, amount}` lines.
    pub lines: Vec<AllocationLine>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl AllocationTransaction {
    /// Builds the record from allocation lines, enforcing that the lines
    /// sum exactly to `total`.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::InvalidAmount` if the sums disagree or the
    /// total is not positive.
    #[allow(clippy::too_many_arguments)]
    pub fn from_lines(
        company_id: CompanyId,
        employee_id: EmployeeId,
        report_id: ReportId,
        expense_id: Option<ExpenseId>,
        total: Decimal,
        currency: Currency,
        lines: Vec<AllocationLine>,
        now: DateTime<Utc>,
    ) -> Result<Self, VoucherError> {
        let sum: Decimal = lines.iter().map(|l| l.amount).sum();
        if total <= Decimal::ZERO || sum != total {
            return Err(VoucherError::InvalidAmount { amount: total });
        }

        Ok(Self {
            id: AllocationId::new(),
            company_id,
            employee_id,
            report_id,
            expense_id,
            total,
            currency,
            lines,
            created_at: now,
        })
    }
}

/// How a multi-voucher application treats an unfundable remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortfallPolicy {
    /// Fail the whole application if the plan cannot cover the amount.
    /// Used at report finalization: a partially funded report is worse
    /// than an explicit "insufficient funds" the employee can act on.
    Reject,
    /// Apply whatever the plan covers and report the shortfall back.
    Partial,
}

/// Everything a multi-voucher application produces.
#[derive(Debug, Clone)]
pub struct AllocationApplyOutcome {
    /// One apply outcome per drawn voucher, in plan order.
    pub outcomes: Vec<ApplyOutcome>,
    /// The idempotency/audit record of the whole funding.
    pub transaction: AllocationTransaction,
    /// Amount left unfunded (zero unless the policy was `Partial`).
    pub shortfall: Decimal,
}
