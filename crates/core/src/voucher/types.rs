//! Voucher entity model and balance mutation primitives.
//!
//! A voucher is a pre-paid balance issued to one employee, optionally scoped
//! to a project or cost-centre, in one currency. Every balance-changing path
//! in the engine (application, reversal, return) converges on the mutation
//! primitives defined here, so the conservation invariant
//! `remaining = total - used - returned` is maintained in exactly one place.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use advara_shared::types::{CompanyId, CostCentreId, EmployeeId, ProjectId, VoucherId};
use advara_shared::types::money::Currency;

use super::error::VoucherError;

/// Voucher lifecycle status.
///
/// Status is a pure function of the three balance quantities (see
/// [`derive_status`]); callers never set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Untouched: `remaining == total`.
    Active,
    /// Partially consumed: `0 < remaining < total`.
    Partial,
    /// Fully consumed by usage: `remaining == 0`.
    Exhausted,
    /// Unused balance handed back. Terminal.
    Returned,
}

impl VoucherStatus {
    /// Returns true if no further balance can be drawn from this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Returned)
    }

    /// Returns true if the voucher can fund an application in this status.
    #[must_use]
    pub fn can_apply(&self) -> bool {
        matches!(self, Self::Active | Self::Partial)
    }
}

/// Optional project / cost-centre restriction on a voucher.
///
/// The two axes are matched as alternative allocation tiers, not combined:
/// a project-scoped voucher funds that project's reports first, a
/// cost-centre-scoped one (without a project) comes second, and a fully
/// unscoped voucher is the fallback for anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherScope {
    /// Project the voucher is restricted to, if any.
    pub project_id: Option<ProjectId>,
    /// Cost-centre the voucher is restricted to, if any.
    pub cost_centre_id: Option<CostCentreId>,
}

impl VoucherScope {
    /// A voucher usable as a fallback for anything.
    #[must_use]
    pub const fn unscoped() -> Self {
        Self {
            project_id: None,
            cost_centre_id: None,
        }
    }

    /// A voucher restricted to one project.
    #[must_use]
    pub const fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            cost_centre_id: None,
        }
    }

    /// A voucher restricted to one cost-centre.
    #[must_use]
    pub const fn for_cost_centre(cost_centre_id: CostCentreId) -> Self {
        Self {
            project_id: None,
            cost_centre_id: Some(cost_centre_id),
        }
    }

    /// Returns true if the voucher carries no scope restriction at all.
    #[must_use]
    pub const fn is_unscoped(&self) -> bool {
        self.project_id.is_none() && self.cost_centre_id.is_none()
    }
}

/// A pre-paid balance issued to one employee.
///
/// Invariant (holds after every mutation):
/// `remaining = total - used - returned` and `0 <= remaining <= total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Unique identifier.
    pub id: VoucherId,
    /// Owning company (tenant).
    pub company_id: CompanyId,
    /// Employee the balance belongs to.
    pub employee_id: EmployeeId,
    /// Optional human-readable code (e.g., "ADV-2026-0042").
    pub code: Option<String>,
    /// Currency of all three balance quantities.
    pub currency: Currency,
    /// Issued amount. Immutable after issuance.
    pub total: Decimal,
    /// Amount drawn against expense reports.
    pub used: Decimal,
    /// Amount handed back through the return workflow.
    pub returned: Decimal,
    /// Derived: `total - used - returned`.
    pub remaining: Decimal,
    /// Optional project / cost-centre restriction.
    pub scope: VoucherScope,
    /// Expiry timestamp; expired vouchers fund nothing.
    pub expires_at: Option<DateTime<Utc>>,
    /// Lifecycle status, derived from the balances.
    pub status: VoucherStatus,
    /// Optimistic concurrency counter. Incremented by the store on every
    /// committed mutation; a mismatch fails fast instead of double-spending.
    pub version: i64,
    /// Issuance time. Drives FIFO ordering within an allocation tier.
    pub created_at: DateTime<Utc>,
}

/// Pure status function (applied after every mutation to `used` or `returned`).
///
/// - RETURNED is terminal once reached.
/// - `remaining == 0` is EXHAUSTED.
/// - `remaining < total` is PARTIAL.
/// - Otherwise ACTIVE.
#[must_use]
pub fn derive_status(
    total: Decimal,
    used: Decimal,
    returned: Decimal,
    current: VoucherStatus,
) -> VoucherStatus {
    if current == VoucherStatus::Returned {
        return VoucherStatus::Returned;
    }
    let remaining = total - used - returned;
    if remaining == Decimal::ZERO {
        VoucherStatus::Exhausted
    } else if remaining < total {
        VoucherStatus::Partial
    } else {
        VoucherStatus::Active
    }
}

impl Voucher {
    /// Issues a new voucher with the full amount available.
    ///
    /// # Errors
    ///
    /// Returns `VoucherError::InvalidAmount` if `total` is not positive.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        company_id: CompanyId,
        employee_id: EmployeeId,
        total: Decimal,
        currency: Currency,
        scope: VoucherScope,
        code: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, VoucherError> {
        if total <= Decimal::ZERO {
            return Err(VoucherError::InvalidAmount { amount: total });
        }

        Ok(Self {
            id: VoucherId::new(),
            company_id,
            employee_id,
            code,
            currency,
            total,
            used: Decimal::ZERO,
            returned: Decimal::ZERO,
            remaining: total,
            scope,
            expires_at,
            status: VoucherStatus::Active,
            version: 0,
            created_at: now,
        })
    }

    /// Returns true if the voucher has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Checks the conservation invariant.
    #[must_use]
    pub fn invariant_holds(&self) -> bool {
        self.remaining == self.total - self.used - self.returned
            && self.remaining >= Decimal::ZERO
            && self.remaining <= self.total
    }

    /// Draws `amount` against this voucher.
    ///
    /// Callers validate status, expiry, and ownership first (see
    /// `ApplicationService`); this primitive only guards the balance itself.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive amounts and
    /// `InsufficientBalance` if `amount > remaining`.
    pub fn record_use(&mut self, amount: Decimal) -> Result<(), VoucherError> {
        if amount <= Decimal::ZERO {
            return Err(VoucherError::InvalidAmount { amount });
        }
        if amount > self.remaining {
            return Err(VoucherError::InsufficientBalance {
                requested: amount,
                remaining: self.remaining,
            });
        }

        self.used += amount;
        self.recompute();
        Ok(())
    }

    /// Releases a previously drawn `amount` (reversal path).
    ///
    /// `used` is floored at zero: reversing more than was drawn restores the
    /// voucher fully rather than going negative.
    pub fn release_use(&mut self, amount: Decimal) {
        self.used = (self.used - amount).max(Decimal::ZERO);
        self.recompute();
    }

    /// Records a balance return of exactly `amount`.
    ///
    /// When the return drains the voucher to zero the status becomes
    /// RETURNED (terminal), not EXHAUSTED: the balance left through the
    /// return path, not through usage.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive amounts and
    /// `InsufficientBalance` if `amount > remaining`.
    pub fn record_return(&mut self, amount: Decimal) -> Result<(), VoucherError> {
        if amount <= Decimal::ZERO {
            return Err(VoucherError::InvalidAmount { amount });
        }
        if amount > self.remaining {
            return Err(VoucherError::InsufficientBalance {
                requested: amount,
                remaining: self.remaining,
            });
        }

        self.returned += amount;
        self.recompute();
        if self.remaining == Decimal::ZERO {
            self.status = VoucherStatus::Returned;
        }
        Ok(())
    }

    /// Re-derives `remaining` and `status` from the balance quantities.
    fn recompute(&mut self) {
        self.remaining = self.total - self.used - self.returned;
        self.status = derive_status(self.total, self.used, self.returned, self.status);
        debug_assert!(self.invariant_holds(), "voucher invariant violated");
    }
}
