//! Allocation domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use advara_shared::types::{CostCentreId, EmployeeId, ProjectId, VoucherId};
use advara_shared::types::money::Currency;

/// One priority level in the allocation search order.
///
/// Tiers are evaluated strictly in this order; a lower tier is touched only
/// when every higher tier is exhausted or not applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Vouchers scoped to the request's project.
    ProjectScoped,
    /// Vouchers scoped to the request's cost-centre and to no project.
    CostCentreScoped,
    /// Vouchers with no scope at all - the fallback for anything.
    Unscoped,
}

/// A request to fund `amount` for one employee in one currency.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    /// The employee whose vouchers may be drawn.
    pub employee_id: EmployeeId,
    /// Currency the amount is denominated in.
    pub currency: Currency,
    /// The amount the caller wants funded.
    pub amount: Decimal,
    /// Project the spend belongs to, if any (enables tier 1).
    pub project_id: Option<ProjectId>,
    /// Cost-centre the spend belongs to, if any (enables tier 2).
    pub cost_centre_id: Option<CostCentreId>,
    /// Vouchers the caller wants left out of this plan.
    pub exclude: Vec<VoucherId>,
}

/// One voucher's contribution to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// The voucher to draw from.
    pub voucher_id: VoucherId,
    /// How much to draw. Always positive, never more than the voucher's
    /// remaining balance at planning time.
    pub amount: Decimal,
    /// The tier the voucher matched.
    pub tier: Tier,
}

/// The computed funding plan: ordered lines plus the total actually covered.
///
/// `allocated` may be less than the requested amount when funds are
/// insufficient; the planner always returns the maximal achievable
/// allocation and leaves the shortfall decision to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Ordered allocation lines (tier priority, then FIFO within a tier).
    pub lines: Vec<AllocationLine>,
    /// Sum of all line amounts.
    pub allocated: Decimal,
}

impl AllocationPlan {
    /// Amount of the request left unfunded by this plan.
    #[must_use]
    pub fn shortfall(&self, requested: Decimal) -> Decimal {
        (requested - self.allocated).max(Decimal::ZERO)
    }

    /// Returns true if the plan fully covers the requested amount.
    #[must_use]
    pub fn covers(&self, requested: Decimal) -> bool {
        self.allocated >= requested
    }

    /// Returns true if nothing could be allocated at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
