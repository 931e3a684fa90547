//! Voucher application business logic.
//!
//! Pure and storage-agnostic: the caller loads the voucher(s) and the report
//! snapshot, this service validates and computes the post-apply state, and
//! the repository layer commits everything in one database transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use advara_shared::types::{EmployeeId, ExpenseId, UsageId};
use advara_shared::types::money::Currency;

use crate::allocation::{AllocationEngine, AllocationRequest};
use crate::journal::{JournalEntryInput, LedgerEntryKind};
use crate::voucher::{Voucher, VoucherError, VoucherStatus};

use super::types::{
    AllocationApplyOutcome, AllocationTransaction, ApplyOutcome, ReportSnapshot, ShortfallPolicy,
    UsageStatus, VoucherUsage,
};

/// Applies voucher balances to expense reports.
pub struct ApplicationService;

impl ApplicationService {
    /// Validates a single apply without performing it.
    ///
    /// Check order is ownership first, then report state, then voucher
    /// state, then amount, so the caller always sees the most fundamental
    /// problem. `duplicate_exists` is whether a non-reversed usage already
    /// links this voucher to this report; the store answers that under its
    /// unique index, this is the pre-flight check.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a [`VoucherError`].
    pub fn validate_apply(
        voucher: &Voucher,
        report: &ReportSnapshot,
        amount: Decimal,
        actor: EmployeeId,
        duplicate_exists: bool,
        now: DateTime<Utc>,
    ) -> Result<(), VoucherError> {
        if report.owner_id != actor {
            return Err(VoucherError::ReportOwnership {
                report_id: report.id,
                employee_id: actor,
            });
        }
        if !report.editable {
            return Err(VoucherError::ReportNotEditable(report.id));
        }
        if voucher.employee_id != actor {
            return Err(VoucherError::VoucherOwnership {
                voucher_id: voucher.id,
                employee_id: actor,
            });
        }
        match voucher.status {
            VoucherStatus::Returned => return Err(VoucherError::VoucherReturned(voucher.id)),
            VoucherStatus::Exhausted => return Err(VoucherError::VoucherExhausted(voucher.id)),
            VoucherStatus::Active | VoucherStatus::Partial => {}
        }
        if voucher.is_expired(now) {
            return Err(VoucherError::VoucherExpired(voucher.id));
        }
        if amount <= Decimal::ZERO {
            return Err(VoucherError::InvalidAmount { amount });
        }
        if amount > voucher.remaining {
            return Err(VoucherError::InsufficientBalance {
                requested: amount,
                remaining: voucher.remaining,
            });
        }
        if duplicate_exists {
            return Err(VoucherError::AlreadyApplied {
                voucher_id: voucher.id,
                report_id: report.id,
            });
        }
        Ok(())
    }

    /// Applies `amount` of one voucher to one report.
    ///
    /// Returns the post-apply voucher, the new usage row, and the "used"
    /// journal entry. Nothing is persisted here; the returned outcome is
    /// what the repository commits atomically.
    ///
    /// # Errors
    ///
    /// Returns a [`VoucherError`] if validation fails. The input voucher is
    /// untouched on failure.
    pub fn apply(
        voucher: &Voucher,
        report: &ReportSnapshot,
        amount: Decimal,
        actor: EmployeeId,
        duplicate_exists: bool,
        now: DateTime<Utc>,
    ) -> Result<ApplyOutcome, VoucherError> {
        Self::validate_apply(voucher, report, amount, actor, duplicate_exists, now)?;

        let mut updated = voucher.clone();
        updated.record_use(amount)?;

        let usage = VoucherUsage {
            id: UsageId::new(),
            voucher_id: updated.id,
            report_id: report.id,
            employee_id: updated.employee_id,
            amount,
            currency: updated.currency,
            status: UsageStatus::Applied,
            applied_by: actor,
            applied_at: now,
            reversed_by: None,
            reversed_at: None,
            reversal_reason: None,
        };

        let journal = JournalEntryInput::for_voucher(
            LedgerEntryKind::Used,
            &updated,
            Some(report.id),
            amount,
            format!("Advance applied to report {}", report.id),
            now.date_naive(),
        );

        Ok(ApplyOutcome {
            voucher: updated,
            usage,
            journal,
        })
    }

    /// Funds `amount` of a report from the employee's vouchers, planning
    /// across tiers and applying each planned line.
    ///
    /// Under [`ShortfallPolicy::Reject`] the whole application fails if the
    /// plan cannot cover `amount`. Under [`ShortfallPolicy::Partial`] the
    /// covered portion is applied and the shortfall is reported back; a plan
    /// that covers nothing at all still fails, because an empty funding
    /// record would be meaningless.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` on an unacceptable shortfall and
    /// propagates per-line validation failures, in which case no state has
    /// been produced at all.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_allocation(
        candidates: &[Voucher],
        report: &ReportSnapshot,
        expense_id: Option<ExpenseId>,
        amount: Decimal,
        currency: Currency,
        actor: EmployeeId,
        policy: ShortfallPolicy,
        now: DateTime<Utc>,
    ) -> Result<AllocationApplyOutcome, VoucherError> {
        if amount <= Decimal::ZERO {
            return Err(VoucherError::InvalidAmount { amount });
        }

        let request = AllocationRequest {
            employee_id: actor,
            currency,
            amount,
            project_id: report.project_id,
            cost_centre_id: report.cost_centre_id,
            exclude: vec![],
        };
        let plan = AllocationEngine::plan(&request, candidates, now);

        let shortfall = plan.shortfall(amount);
        if plan.is_empty() || (policy == ShortfallPolicy::Reject && shortfall > Decimal::ZERO) {
            return Err(VoucherError::InsufficientBalance {
                requested: amount,
                remaining: plan.allocated,
            });
        }

        let mut outcomes = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            // The planner only emits ids it drew from `candidates`.
            let voucher = candidates
                .iter()
                .find(|v| v.id == line.voucher_id)
                .ok_or(VoucherError::VoucherNotFound(line.voucher_id))?;
            outcomes.push(Self::apply(
                voucher, report, line.amount, actor, false, now,
            )?);
        }

        let company_id = outcomes[0].voucher.company_id;
        let transaction = AllocationTransaction::from_lines(
            company_id,
            actor,
            report.id,
            expense_id,
            plan.allocated,
            currency,
            plan.lines,
            now,
        )?;

        Ok(AllocationApplyOutcome {
            outcomes,
            transaction,
            shortfall,
        })
    }
}
