//! Return request model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use advara_shared::types::{EmployeeId, ReturnRequestId, VoucherId};
use advara_shared::types::money::Currency;

/// Review status of a return request.
///
/// PENDING requests are exclusive per voucher: a second request cannot be
/// opened while one is awaiting review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnRequestStatus {
    /// Awaiting review. Holds the per-voucher exclusivity slot.
    Pending,
    /// Approved; the voucher balance has been returned.
    Approved,
    /// Rejected; the voucher is untouched.
    Rejected,
}

impl ReturnRequestStatus {
    /// Returns true while the request is still open for review.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// An employee's request to hand back unused voucher balance.
///
/// The amount is validated against the voucher's remaining balance at
/// request time and re-validated at approval time, since applications may
/// have moved the balance in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRequest {
    /// Unique identifier.
    pub id: ReturnRequestId,
    /// The voucher whose balance is being handed back.
    pub voucher_id: VoucherId,
    /// The requesting employee (the voucher's owner).
    pub employee_id: EmployeeId,
    /// Amount to return.
    pub amount: Decimal,
    /// Currency, always the voucher's.
    pub currency: Currency,
    /// Review status.
    pub status: ReturnRequestStatus,
    /// Employee-supplied reason for the return.
    pub reason: Option<String>,
    /// When the request was opened.
    pub requested_at: DateTime<Utc>,
    /// Who reviewed it, once decided.
    pub decided_by: Option<EmployeeId>,
    /// When it was decided.
    pub decided_at: Option<DateTime<Utc>>,
    /// Reviewer's note.
    pub decision_note: Option<String>,
}
