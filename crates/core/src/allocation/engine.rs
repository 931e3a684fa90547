//! The tiered FIFO allocation planner.
//!
//! Given a desired amount and the candidate vouchers, computes which
//! vouchers to draw from and how much from each. Performs no mutation;
//! it only computes the plan.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::voucher::Voucher;

use super::types::{AllocationLine, AllocationPlan, AllocationRequest, Tier};

/// Stateless allocation planner.
///
/// Three tiers are evaluated in strict priority order:
/// 1. Vouchers scoped to the request's project.
/// 2. Vouchers scoped to the request's cost-centre but to no project.
/// 3. Unscoped vouchers.
///
/// Within a tier, candidates are drained oldest-first (FIFO by issuance
/// time). The planner greedily consumes `min(still_needed, remaining)` from
/// each candidate and stops as soon as the request is covered. If the total
/// available across all tiers is less than the request, the maximal
/// achievable plan is returned; the caller decides whether a shortfall is
/// acceptable.
pub struct AllocationEngine;

impl AllocationEngine {
    /// Computes the funding plan for `request` from `candidates`.
    ///
    /// Candidates that are inactive, expired at `now`, in another currency,
    /// owned by someone else, drained, or explicitly excluded are skipped.
    #[must_use]
    pub fn plan(
        request: &AllocationRequest,
        candidates: &[Voucher],
        now: DateTime<Utc>,
    ) -> AllocationPlan {
        if request.amount <= Decimal::ZERO {
            return AllocationPlan::default();
        }

        let mut tiers: [Vec<&Voucher>; 3] = [Vec::new(), Vec::new(), Vec::new()];

        for voucher in candidates {
            if !Self::is_eligible(voucher, request, now) {
                continue;
            }
            if let Some(tier) = Self::tier_of(voucher, request) {
                tiers[tier_index(tier)].push(voucher);
            }
        }

        let mut lines = Vec::new();
        let mut needed = request.amount;

        for (idx, tier_vouchers) in tiers.iter_mut().enumerate() {
            if needed <= Decimal::ZERO {
                break;
            }
            // FIFO: oldest voucher drained first; id (UUIDv7, time-ordered)
            // breaks created_at ties deterministically.
            tier_vouchers.sort_by_key(|v| (v.created_at, v.id.into_inner()));

            for voucher in tier_vouchers.iter() {
                if needed <= Decimal::ZERO {
                    break;
                }
                let take = needed.min(voucher.remaining);
                lines.push(AllocationLine {
                    voucher_id: voucher.id,
                    amount: take,
                    tier: tier_from_index(idx),
                });
                needed -= take;
            }
        }

        let allocated = request.amount - needed.max(Decimal::ZERO);
        AllocationPlan { lines, allocated }
    }

    /// Determines which tier a voucher falls into for this request.
    ///
    /// Returns `None` when the voucher is restricted to a scope the request
    /// does not carry (a voucher scoped to project X never funds a request
    /// for project Y, nor one with no project at all).
    #[must_use]
    pub fn tier_of(voucher: &Voucher, request: &AllocationRequest) -> Option<Tier> {
        if let Some(project_id) = voucher.scope.project_id {
            return (request.project_id == Some(project_id)).then_some(Tier::ProjectScoped);
        }
        if let Some(cost_centre_id) = voucher.scope.cost_centre_id {
            return (request.cost_centre_id == Some(cost_centre_id))
                .then_some(Tier::CostCentreScoped);
        }
        Some(Tier::Unscoped)
    }

    /// Basic eligibility, independent of tiering.
    fn is_eligible(voucher: &Voucher, request: &AllocationRequest, now: DateTime<Utc>) -> bool {
        voucher.employee_id == request.employee_id
            && voucher.status.can_apply()
            && !voucher.is_expired(now)
            && voucher.currency == request.currency
            && voucher.remaining > Decimal::ZERO
            && !request.exclude.contains(&voucher.id)
    }
}

const fn tier_index(tier: Tier) -> usize {
    match tier {
        Tier::ProjectScoped => 0,
        Tier::CostCentreScoped => 1,
        Tier::Unscoped => 2,
    }
}

const fn tier_from_index(idx: usize) -> Tier {
    match idx {
        0 => Tier::ProjectScoped,
        1 => Tier::CostCentreScoped,
        _ => Tier::Unscoped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use advara_shared::types::{CompanyId, CostCentreId, EmployeeId, ProjectId, VoucherId};
    use advara_shared::types::money::Currency;
    use crate::voucher::{VoucherScope, VoucherStatus};

    fn voucher(
        employee_id: EmployeeId,
        total: Decimal,
        scope: VoucherScope,
        created_at: DateTime<Utc>,
    ) -> Voucher {
        Voucher::issue(
            CompanyId::new(),
            employee_id,
            total,
            Currency::Inr,
            scope,
            None,
            None,
            created_at,
        )
        .unwrap()
    }

    fn request(employee_id: EmployeeId, amount: Decimal) -> AllocationRequest {
        AllocationRequest {
            employee_id,
            currency: Currency::Inr,
            amount,
            project_id: None,
            cost_centre_id: None,
            exclude: vec![],
        }
    }

    #[test]
    fn test_fifo_within_tier() {
        let employee = EmployeeId::new();
        let now = Utc::now();
        let a = voucher(employee, dec!(100), VoucherScope::unscoped(), now - Duration::days(2));
        let b = voucher(employee, dec!(50), VoucherScope::unscoped(), now - Duration::days(1));

        // Present newest-first to prove the engine sorts, not the caller.
        let plan = AllocationEngine::plan(&request(employee, dec!(120)), &[b.clone(), a.clone()], now);

        assert_eq!(plan.allocated, dec!(120));
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].voucher_id, a.id);
        assert_eq!(plan.lines[0].amount, dec!(100));
        assert_eq!(plan.lines[1].voucher_id, b.id);
        assert_eq!(plan.lines[1].amount, dec!(20));
    }

    #[test]
    fn test_project_tier_drained_before_unscoped() {
        let employee = EmployeeId::new();
        let project = ProjectId::new();
        let now = Utc::now();
        // Unscoped voucher is OLDER, but the project-scoped one still wins.
        let unscoped = voucher(employee, dec!(100), VoucherScope::unscoped(), now - Duration::days(5));
        let scoped = voucher(employee, dec!(100), VoucherScope::for_project(project), now - Duration::days(1));

        let mut req = request(employee, dec!(150));
        req.project_id = Some(project);

        let plan = AllocationEngine::plan(&req, &[unscoped.clone(), scoped.clone()], now);

        assert_eq!(plan.allocated, dec!(150));
        assert_eq!(plan.lines[0].voucher_id, scoped.id);
        assert_eq!(plan.lines[0].amount, dec!(100));
        assert_eq!(plan.lines[0].tier, Tier::ProjectScoped);
        assert_eq!(plan.lines[1].voucher_id, unscoped.id);
        assert_eq!(plan.lines[1].amount, dec!(50));
        assert_eq!(plan.lines[1].tier, Tier::Unscoped);
    }

    #[test]
    fn test_cost_centre_tier_between_project_and_unscoped() {
        let employee = EmployeeId::new();
        let project = ProjectId::new();
        let cost_centre = CostCentreId::new();
        let now = Utc::now();

        let p = voucher(employee, dec!(10), VoucherScope::for_project(project), now);
        let c = voucher(employee, dec!(10), VoucherScope::for_cost_centre(cost_centre), now);
        let u = voucher(employee, dec!(10), VoucherScope::unscoped(), now);

        let mut req = request(employee, dec!(30));
        req.project_id = Some(project);
        req.cost_centre_id = Some(cost_centre);

        let plan = AllocationEngine::plan(&req, &[u.clone(), c.clone(), p.clone()], now);

        let order: Vec<_> = plan.lines.iter().map(|l| l.voucher_id).collect();
        assert_eq!(order, vec![p.id, c.id, u.id]);
    }

    #[test]
    fn test_foreign_project_scope_is_ineligible() {
        let employee = EmployeeId::new();
        let now = Utc::now();
        let other = voucher(
            employee,
            dec!(100),
            VoucherScope::for_project(ProjectId::new()),
            now,
        );

        // Request with no project: project-scoped voucher must not fund it.
        let plan = AllocationEngine::plan(&request(employee, dec!(50)), &[other], now);
        assert!(plan.is_empty());
        assert_eq!(plan.allocated, Decimal::ZERO);
    }

    #[test]
    fn test_shortfall_returns_maximal_plan() {
        let employee = EmployeeId::new();
        let now = Utc::now();
        let v = voucher(employee, dec!(70), VoucherScope::unscoped(), now);

        let plan = AllocationEngine::plan(&request(employee, dec!(100)), &[v.clone()], now);

        assert_eq!(plan.allocated, dec!(70));
        assert_eq!(plan.shortfall(dec!(100)), dec!(30));
        assert_eq!(plan.lines[0].amount, dec!(70));
    }

    #[test]
    fn test_skips_expired_wrong_currency_and_excluded() {
        let employee = EmployeeId::new();
        let now = Utc::now();

        let mut expired = voucher(employee, dec!(100), VoucherScope::unscoped(), now - Duration::days(3));
        expired.expires_at = Some(now - Duration::days(1));

        let mut foreign = voucher(employee, dec!(100), VoucherScope::unscoped(), now - Duration::days(3));
        foreign.currency = Currency::Usd;

        let excluded = voucher(employee, dec!(100), VoucherScope::unscoped(), now - Duration::days(3));
        let good = voucher(employee, dec!(100), VoucherScope::unscoped(), now - Duration::days(2));

        let mut req = request(employee, dec!(100));
        req.exclude = vec![excluded.id];

        let plan = AllocationEngine::plan(
            &req,
            &[expired, foreign, excluded, good.clone()],
            now,
        );

        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].voucher_id, good.id);
    }

    #[test]
    fn test_skips_terminal_and_drained_vouchers() {
        let employee = EmployeeId::new();
        let now = Utc::now();

        let mut exhausted = voucher(employee, dec!(100), VoucherScope::unscoped(), now);
        exhausted.record_use(dec!(100)).unwrap();
        assert_eq!(exhausted.status, VoucherStatus::Exhausted);

        let mut returned = voucher(employee, dec!(100), VoucherScope::unscoped(), now);
        returned.record_return(dec!(100)).unwrap();

        let plan = AllocationEngine::plan(&request(employee, dec!(10)), &[exhausted, returned], now);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_other_employees_vouchers_never_drawn() {
        let now = Utc::now();
        let theirs = voucher(EmployeeId::new(), dec!(100), VoucherScope::unscoped(), now);

        let plan = AllocationEngine::plan(&request(EmployeeId::new(), dec!(10)), &[theirs], now);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_excluded_voucher_leaves_plan_short() {
        let employee = EmployeeId::new();
        let now = Utc::now();
        let only = voucher(employee, dec!(100), VoucherScope::unscoped(), now);

        let mut req = request(employee, dec!(50));
        req.exclude = vec![only.id, VoucherId::new()];

        let plan = AllocationEngine::plan(&req, &[only], now);
        assert_eq!(plan.shortfall(dec!(50)), dec!(50));
    }
}
