//! Reversal business logic.
//!
//! When a report is rejected, every non-reversed usage that funded it is
//! undone: the exact drawn amount goes back onto its voucher, the usage row
//! flips to REVERSED, and a mirroring journal entry is produced. Reversal is
//! idempotent at the usage level, so re-processing a rejection is harmless.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use advara_shared::types::{EmployeeId, ReportId};

use crate::application::{UsageStatus, VoucherUsage};
use crate::journal::{JournalEntryInput, LedgerEntryKind};
use crate::voucher::{Voucher, VoucherError};

/// The result of reversing one usage.
#[derive(Debug, Clone)]
pub struct ReversalOutcome {
    /// The voucher with the drawn amount restored.
    pub voucher: Voucher,
    /// The usage, now REVERSED.
    pub usage: VoucherUsage,
    /// The mirroring "reversed" journal row.
    pub journal: JournalEntryInput,
}

/// The result of reversing everything that funded one report.
#[derive(Debug, Clone)]
pub struct ReportReversal {
    /// One outcome per usage that was actually reversed.
    pub outcomes: Vec<ReversalOutcome>,
    /// Usages skipped because they were already reversed.
    pub skipped: usize,
    /// Sum restored across all vouchers.
    pub restored: Decimal,
}

/// Undoes voucher applications after report rejection.
pub struct ReversalService;

impl ReversalService {
    /// Reverses a single usage against its voucher.
    ///
    /// Returns `None` if the usage is already reversed (idempotent skip);
    /// the caller counts those rather than failing a re-delivered rejection.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotFound` if `voucher` is not the usage's voucher.
    pub fn reverse_usage(
        voucher: &Voucher,
        usage: &VoucherUsage,
        actor: EmployeeId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<ReversalOutcome>, VoucherError> {
        if usage.voucher_id != voucher.id {
            return Err(VoucherError::VoucherNotFound(usage.voucher_id));
        }
        if usage.status == UsageStatus::Reversed {
            return Ok(None);
        }

        let mut restored = voucher.clone();
        restored.release_use(usage.amount);

        let mut reversed = usage.clone();
        reversed.status = UsageStatus::Reversed;
        reversed.reversed_by = Some(actor);
        reversed.reversed_at = Some(now);
        reversed.reversal_reason = reason;

        let journal = JournalEntryInput::for_voucher(
            LedgerEntryKind::Reversed,
            &restored,
            Some(usage.report_id),
            usage.amount,
            format!("Advance application reversed for report {}", usage.report_id),
            now.date_naive(),
        );

        Ok(Some(ReversalOutcome {
            voucher: restored,
            usage: reversed,
            journal,
        }))
    }

    /// Reverses every non-reversed usage that funded `report_id`.
    ///
    /// `pairs` carries each usage with the current state of its voucher, as
    /// loaded inside the caller's transaction. Usages for other reports are
    /// rejected outright; already-reversed usages are skipped and counted.
    ///
    /// # Errors
    ///
    /// Returns `ReportNotFound` when a usage belongs to a different report
    /// and propagates [`Self::reverse_usage`] failures.
    pub fn reverse_report(
        report_id: ReportId,
        pairs: &[(Voucher, VoucherUsage)],
        actor: EmployeeId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReportReversal, VoucherError> {
        let mut outcomes = Vec::with_capacity(pairs.len());
        let mut skipped = 0usize;
        let mut restored = Decimal::ZERO;

        for (voucher, usage) in pairs {
            if usage.report_id != report_id {
                return Err(VoucherError::ReportNotFound(usage.report_id));
            }
            match Self::reverse_usage(voucher, usage, actor, reason.clone(), now)? {
                Some(outcome) => {
                    restored += outcome.usage.amount;
                    outcomes.push(outcome);
                }
                None => skipped += 1,
            }
        }

        Ok(ReportReversal {
            outcomes,
            skipped,
            restored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use advara_shared::types::{CompanyId, ReportId};
    use advara_shared::types::money::Currency;
    use crate::application::{ApplicationService, ReportSnapshot, ShortfallPolicy};
    use crate::voucher::{VoucherScope, VoucherStatus};

    fn applied(total: Decimal, amount: Decimal) -> (Voucher, VoucherUsage, ReportSnapshot) {
        let employee = EmployeeId::new();
        let now = Utc::now();
        let voucher = Voucher::issue(
            CompanyId::new(),
            employee,
            total,
            Currency::Inr,
            VoucherScope::unscoped(),
            None,
            None,
            now,
        )
        .unwrap();
        let report = ReportSnapshot {
            id: ReportId::new(),
            owner_id: employee,
            editable: true,
            project_id: None,
            cost_centre_id: None,
        };
        let outcome =
            ApplicationService::apply(&voucher, &report, amount, employee, false, now).unwrap();
        (outcome.voucher, outcome.usage, report)
    }

    #[test]
    fn test_reverse_restores_exact_amount() {
        let (voucher, usage, _) = applied(dec!(100), dec!(40));
        let now = Utc::now();
        let actor = EmployeeId::new();

        let outcome = ReversalService::reverse_usage(&voucher, &usage, actor, None, now)
            .unwrap()
            .unwrap();

        assert_eq!(outcome.voucher.used, Decimal::ZERO);
        assert_eq!(outcome.voucher.remaining, dec!(100));
        assert_eq!(outcome.voucher.status, VoucherStatus::Active);
        assert!(outcome.voucher.invariant_holds());

        assert_eq!(outcome.usage.status, UsageStatus::Reversed);
        assert_eq!(outcome.usage.reversed_by, Some(actor));
        assert!(outcome.usage.reversed_at.is_some());

        assert_eq!(outcome.journal.kind, LedgerEntryKind::Reversed);
        assert_eq!(outcome.journal.amount, dec!(40));
    }

    #[test]
    fn test_reverse_exhausted_voucher_reopens_it() {
        let (voucher, usage, _) = applied(dec!(50), dec!(50));
        assert_eq!(voucher.status, VoucherStatus::Exhausted);

        let outcome =
            ReversalService::reverse_usage(&voucher, &usage, EmployeeId::new(), None, Utc::now())
                .unwrap()
                .unwrap();

        assert_eq!(outcome.voucher.status, VoucherStatus::Active);
        assert_eq!(outcome.voucher.remaining, dec!(50));
    }

    #[test]
    fn test_reverse_is_idempotent() {
        let (voucher, usage, _) = applied(dec!(100), dec!(40));
        let now = Utc::now();
        let actor = EmployeeId::new();

        let first = ReversalService::reverse_usage(&voucher, &usage, actor, None, now)
            .unwrap()
            .unwrap();
        let second =
            ReversalService::reverse_usage(&first.voucher, &first.usage, actor, None, now).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_reverse_rejects_mismatched_voucher() {
        let (_, usage, _) = applied(dec!(100), dec!(40));
        let other = Voucher::issue(
            CompanyId::new(),
            usage.employee_id,
            dec!(10),
            Currency::Inr,
            VoucherScope::unscoped(),
            None,
            None,
            Utc::now(),
        )
        .unwrap();

        let err = ReversalService::reverse_usage(&other, &usage, EmployeeId::new(), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, VoucherError::VoucherNotFound(_)));
    }

    #[test]
    fn test_reverse_report_handles_mixed_usages() {
        let employee = EmployeeId::new();
        let now = Utc::now();
        let report = ReportSnapshot {
            id: ReportId::new(),
            owner_id: employee,
            editable: true,
            project_id: None,
            cost_centre_id: None,
        };

        let issue = |total| {
            Voucher::issue(
                CompanyId::new(),
                employee,
                total,
                Currency::Inr,
                VoucherScope::unscoped(),
                None,
                None,
                now,
            )
            .unwrap()
        };

        let a = ApplicationService::apply(&issue(dec!(100)), &report, dec!(60), employee, false, now)
            .unwrap();
        let b = ApplicationService::apply(&issue(dec!(50)), &report, dec!(50), employee, false, now)
            .unwrap();

        // Pretend `a` was already reversed by an earlier delivery.
        let already = ReversalService::reverse_usage(&a.voucher, &a.usage, employee, None, now)
            .unwrap()
            .unwrap();

        let pairs = vec![
            (already.voucher.clone(), already.usage.clone()),
            (b.voucher.clone(), b.usage.clone()),
        ];
        let reversal = ReversalService::reverse_report(
            report.id,
            &pairs,
            employee,
            Some("rejected by approver".to_string()),
            now,
        )
        .unwrap();

        assert_eq!(reversal.outcomes.len(), 1);
        assert_eq!(reversal.skipped, 1);
        assert_eq!(reversal.restored, dec!(50));
        assert_eq!(reversal.outcomes[0].usage.voucher_id, b.voucher.id);
        assert_eq!(
            reversal.outcomes[0].usage.reversal_reason.as_deref(),
            Some("rejected by approver")
        );
    }

    #[test]
    fn test_reverse_report_restores_split_allocation() {
        let employee = EmployeeId::new();
        let company = CompanyId::new();
        let now = Utc::now();
        let report = ReportSnapshot {
            id: ReportId::new(),
            owner_id: employee,
            editable: true,
            project_id: None,
            cost_centre_id: None,
        };

        let issue = |total, issued_at| {
            Voucher::issue(
                company,
                employee,
                total,
                Currency::Inr,
                VoucherScope::unscoped(),
                None,
                None,
                issued_at,
            )
            .unwrap()
        };
        let a = issue(dec!(100), now - chrono::Duration::days(1));
        let b = issue(dec!(50), now);

        // 120 INR drains A entirely and takes 20 from B.
        let applied = ApplicationService::apply_allocation(
            &[a.clone(), b.clone()],
            &report,
            None,
            dec!(120),
            Currency::Inr,
            employee,
            ShortfallPolicy::Reject,
            now,
        )
        .unwrap();
        let pairs: Vec<_> = applied
            .outcomes
            .iter()
            .map(|o| (o.voucher.clone(), o.usage.clone()))
            .collect();

        let reversal =
            ReversalService::reverse_report(report.id, &pairs, employee, None, now).unwrap();

        assert_eq!(reversal.outcomes.len(), 2);
        assert_eq!(reversal.skipped, 0);
        assert_eq!(reversal.restored, dec!(120));
        for outcome in &reversal.outcomes {
            assert_eq!(outcome.voucher.used, Decimal::ZERO);
            assert_eq!(outcome.voucher.status, VoucherStatus::Active);
            assert_eq!(outcome.usage.status, UsageStatus::Reversed);
            assert!(outcome.voucher.invariant_holds());
        }

        let restored_a = reversal.outcomes.iter().find(|o| o.voucher.id == a.id).unwrap();
        assert_eq!(restored_a.voucher.remaining, dec!(100));
        let restored_b = reversal.outcomes.iter().find(|o| o.voucher.id == b.id).unwrap();
        assert_eq!(restored_b.voucher.remaining, dec!(50));
    }

    #[test]
    fn test_reverse_report_rejects_foreign_usage() {
        let (voucher, usage, _) = applied(dec!(100), dec!(40));
        let pairs = vec![(voucher, usage)];

        let err = ReversalService::reverse_report(
            ReportId::new(),
            &pairs,
            EmployeeId::new(),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, VoucherError::ReportNotFound(_)));
    }
}
