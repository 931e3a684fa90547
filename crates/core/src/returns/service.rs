//! Return workflow business logic.
//!
//! Two paths hand balance back: the employee-initiated request/review flow
//! and the direct admin return. Both converge on `Voucher::record_return`,
//! so the conservation invariant and the terminal RETURNED status come from
//! one place.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use advara_shared::types::{EmployeeId, ReturnRequestId};

use crate::journal::{JournalEntryInput, LedgerEntryKind};
use crate::voucher::{Voucher, VoucherError, VoucherStatus};

use super::types::{ReturnRequest, ReturnRequestStatus};

/// Everything an executed return produces.
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    /// The voucher with the returned amount booked.
    pub voucher: Voucher,
    /// The decided request, when the return came through the review flow.
    pub request: Option<ReturnRequest>,
    /// The "returned" journal row.
    pub journal: JournalEntryInput,
}

/// Hands unused voucher balance back through request/review or directly.
pub struct ReturnService;

impl ReturnService {
    /// Opens a return request for `amount` of the voucher's balance.
    ///
    /// `pending_exists` is whether the store already holds a PENDING request
    /// for this voucher (enforced there by a partial unique index; this is
    /// the pre-flight check).
    ///
    /// # Errors
    ///
    /// Rejects foreign vouchers, terminal vouchers, non-positive or
    /// over-remaining amounts, and a second concurrent request.
    pub fn request_return(
        voucher: &Voucher,
        amount: Decimal,
        actor: EmployeeId,
        reason: Option<String>,
        pending_exists: bool,
        now: DateTime<Utc>,
    ) -> Result<ReturnRequest, VoucherError> {
        Self::validate_voucher(voucher, actor)?;
        Self::validate_amount(voucher, amount)?;
        if pending_exists {
            return Err(VoucherError::PendingRequestExists(voucher.id));
        }

        Ok(ReturnRequest {
            id: ReturnRequestId::new(),
            voucher_id: voucher.id,
            employee_id: actor,
            amount,
            currency: voucher.currency,
            status: ReturnRequestStatus::Pending,
            reason,
            requested_at: now,
            decided_by: None,
            decided_at: None,
            decision_note: None,
        })
    }

    /// Approves a pending request and books the return.
    ///
    /// The amount is re-validated against the voucher's remaining balance
    /// here, not just at request time: applications may have drawn the
    /// balance down while the request sat in review.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotPending` for already-decided requests,
    /// `VoucherNotFound` on a voucher/request mismatch, and the same
    /// balance errors as [`Self::request_return`].
    pub fn approve(
        voucher: &Voucher,
        request: &ReturnRequest,
        reviewer: EmployeeId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReturnOutcome, VoucherError> {
        if request.voucher_id != voucher.id {
            return Err(VoucherError::VoucherNotFound(request.voucher_id));
        }
        if !request.status.is_pending() {
            return Err(VoucherError::RequestNotPending(request.id));
        }
        Self::validate_amount(voucher, request.amount)?;

        let mut updated = voucher.clone();
        updated.record_return(request.amount)?;

        let mut decided = request.clone();
        decided.status = ReturnRequestStatus::Approved;
        decided.decided_by = Some(reviewer);
        decided.decided_at = Some(now);
        decided.decision_note = note;

        let journal = JournalEntryInput::for_voucher(
            LedgerEntryKind::Returned,
            &updated,
            None,
            request.amount,
            format!("Advance balance returned on request {}", request.id),
            now.date_naive(),
        );

        Ok(ReturnOutcome {
            voucher: updated,
            request: Some(decided),
            journal,
        })
    }

    /// Rejects a pending request, leaving the voucher untouched.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotPending` for already-decided requests.
    pub fn reject(
        request: &ReturnRequest,
        reviewer: EmployeeId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReturnRequest, VoucherError> {
        if !request.status.is_pending() {
            return Err(VoucherError::RequestNotPending(request.id));
        }

        let mut decided = request.clone();
        decided.status = ReturnRequestStatus::Rejected;
        decided.decided_by = Some(reviewer);
        decided.decided_at = Some(now);
        decided.decision_note = note;
        Ok(decided)
    }

    /// Books a return directly, without the review flow (admin path).
    ///
    /// The amount is clamped to the current remaining balance, so "return
    /// everything" callers can pass any sufficiently large figure and land
    /// the voucher exactly on RETURNED.
    ///
    /// # Errors
    ///
    /// Rejects foreign vouchers, terminal vouchers, and non-positive
    /// amounts.
    pub fn direct_return(
        voucher: &Voucher,
        amount: Decimal,
        actor: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<ReturnOutcome, VoucherError> {
        Self::validate_voucher(voucher, actor)?;
        if amount <= Decimal::ZERO {
            return Err(VoucherError::InvalidAmount { amount });
        }

        let clamped = amount.min(voucher.remaining);
        let mut updated = voucher.clone();
        updated.record_return(clamped)?;

        let journal = JournalEntryInput::for_voucher(
            LedgerEntryKind::Returned,
            &updated,
            None,
            clamped,
            "Advance balance returned directly".to_string(),
            now.date_naive(),
        );

        Ok(ReturnOutcome {
            voucher: updated,
            request: None,
            journal,
        })
    }

    fn validate_voucher(voucher: &Voucher, actor: EmployeeId) -> Result<(), VoucherError> {
        if voucher.employee_id != actor {
            return Err(VoucherError::VoucherOwnership {
                voucher_id: voucher.id,
                employee_id: actor,
            });
        }
        match voucher.status {
            VoucherStatus::Returned => Err(VoucherError::VoucherReturned(voucher.id)),
            VoucherStatus::Exhausted => Err(VoucherError::VoucherExhausted(voucher.id)),
            VoucherStatus::Active | VoucherStatus::Partial => Ok(()),
        }
    }

    fn validate_amount(voucher: &Voucher, amount: Decimal) -> Result<(), VoucherError> {
        if amount <= Decimal::ZERO {
            return Err(VoucherError::InvalidAmount { amount });
        }
        if amount > voucher.remaining {
            return Err(VoucherError::InsufficientBalance {
                requested: amount,
                remaining: voucher.remaining,
            });
        }
        Ok(())
    }
}
