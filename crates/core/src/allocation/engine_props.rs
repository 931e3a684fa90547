//! Property tests for the allocation planner.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use advara_shared::types::{CompanyId, CostCentreId, EmployeeId, ProjectId};
use advara_shared::types::money::Currency;

use crate::voucher::{Voucher, VoucherScope};

use super::engine::AllocationEngine;
use super::types::{AllocationRequest, Tier};

/// Scope shape for a generated voucher.
#[derive(Debug, Clone, Copy)]
enum ScopeKind {
    MatchingProject,
    MatchingCostCentre,
    Unscoped,
    ForeignProject,
}

fn scope_kind_strategy() -> impl Strategy<Value = ScopeKind> {
    prop_oneof![
        Just(ScopeKind::MatchingProject),
        Just(ScopeKind::MatchingCostCentre),
        Just(ScopeKind::Unscoped),
        Just(ScopeKind::ForeignProject),
    ]
}

/// (total, age in minutes, scope kind) per voucher.
fn voucher_spec_strategy() -> impl Strategy<Value = (i64, i64, ScopeKind)> {
    (1i64..=10_000, 0i64..=100_000, scope_kind_strategy())
}

fn build_fleet(
    specs: &[(i64, i64, ScopeKind)],
    employee: EmployeeId,
    project: ProjectId,
    cost_centre: CostCentreId,
) -> Vec<Voucher> {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    specs
        .iter()
        .map(|&(total, age_minutes, kind)| {
            let scope = match kind {
                ScopeKind::MatchingProject => VoucherScope::for_project(project),
                ScopeKind::MatchingCostCentre => VoucherScope::for_cost_centre(cost_centre),
                ScopeKind::Unscoped => VoucherScope::unscoped(),
                ScopeKind::ForeignProject => VoucherScope::for_project(ProjectId::new()),
            };
            Voucher::issue(
                CompanyId::new(),
                employee,
                Decimal::new(total, 2),
                Currency::Inr,
                scope,
                None,
                None,
                base + Duration::minutes(age_minutes),
            )
            .unwrap()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// allocated == min(requested, total eligible balance), always.
    #[test]
    fn prop_allocated_is_maximal_and_bounded(
        specs in prop::collection::vec(voucher_spec_strategy(), 0..12),
        requested_raw in 1i64..=50_000,
    ) {
        let employee = EmployeeId::new();
        let project = ProjectId::new();
        let cost_centre = CostCentreId::new();
        let fleet = build_fleet(&specs, employee, project, cost_centre);
        let requested = Decimal::new(requested_raw, 2);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        let request = AllocationRequest {
            employee_id: employee,
            currency: Currency::Inr,
            amount: requested,
            project_id: Some(project),
            cost_centre_id: Some(cost_centre),
            exclude: vec![],
        };
        let plan = AllocationEngine::plan(&request, &fleet, now);

        let available: Decimal = fleet
            .iter()
            .filter(|v| AllocationEngine::tier_of(v, &request).is_some())
            .map(|v| v.remaining)
            .sum();

        prop_assert_eq!(plan.allocated, requested.min(available));
    }

    /// Line amounts are positive, within each voucher's remaining balance,
    /// and sum exactly to `allocated`. No voucher appears twice.
    #[test]
    fn prop_lines_are_well_formed(
        specs in prop::collection::vec(voucher_spec_strategy(), 0..12),
        requested_raw in 1i64..=50_000,
    ) {
        let employee = EmployeeId::new();
        let project = ProjectId::new();
        let cost_centre = CostCentreId::new();
        let fleet = build_fleet(&specs, employee, project, cost_centre);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        let request = AllocationRequest {
            employee_id: employee,
            currency: Currency::Inr,
            amount: Decimal::new(requested_raw, 2),
            project_id: Some(project),
            cost_centre_id: Some(cost_centre),
            exclude: vec![],
        };
        let plan = AllocationEngine::plan(&request, &fleet, now);

        let mut seen = std::collections::HashSet::new();
        let mut sum = Decimal::ZERO;
        for line in &plan.lines {
            prop_assert!(line.amount > Decimal::ZERO, "zero-amount line");
            prop_assert!(seen.insert(line.voucher_id), "voucher drawn twice");

            let voucher = fleet.iter().find(|v| v.id == line.voucher_id).unwrap();
            prop_assert!(line.amount <= voucher.remaining);
            sum += line.amount;
        }
        prop_assert_eq!(sum, plan.allocated);
    }

    /// Tier priority: every project-tier line precedes every cost-centre
    /// line, which precedes every unscoped line; and a lower tier is only
    /// touched when every eligible voucher in the higher tiers is drained.
    #[test]
    fn prop_tier_priority_is_strict(
        specs in prop::collection::vec(voucher_spec_strategy(), 1..12),
        requested_raw in 1i64..=50_000,
    ) {
        let employee = EmployeeId::new();
        let project = ProjectId::new();
        let cost_centre = CostCentreId::new();
        let fleet = build_fleet(&specs, employee, project, cost_centre);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        let request = AllocationRequest {
            employee_id: employee,
            currency: Currency::Inr,
            amount: Decimal::new(requested_raw, 2),
            project_id: Some(project),
            cost_centre_id: Some(cost_centre),
            exclude: vec![],
        };
        let plan = AllocationEngine::plan(&request, &fleet, now);

        // Tiers never interleave and never regress.
        let tiers: Vec<Tier> = plan.lines.iter().map(|l| l.tier).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        prop_assert_eq!(&tiers, &sorted);

        // If any lower-tier line exists, every higher-tier voucher was fully drained.
        if let Some(lowest) = tiers.last().copied() {
            for voucher in &fleet {
                let Some(tier) = AllocationEngine::tier_of(voucher, &request) else {
                    continue;
                };
                if tier < lowest {
                    let drawn: Decimal = plan
                        .lines
                        .iter()
                        .filter(|l| l.voucher_id == voucher.id)
                        .map(|l| l.amount)
                        .sum();
                    prop_assert_eq!(
                        drawn,
                        voucher.remaining,
                        "higher-tier voucher left partially drained"
                    );
                }
            }
        }
    }

    /// FIFO: within one tier, a voucher contributes only if every older
    /// voucher in that tier is fully drained.
    #[test]
    fn prop_fifo_within_tier(
        specs in prop::collection::vec(voucher_spec_strategy(), 1..12),
        requested_raw in 1i64..=50_000,
    ) {
        let employee = EmployeeId::new();
        let project = ProjectId::new();
        let cost_centre = CostCentreId::new();
        let fleet = build_fleet(&specs, employee, project, cost_centre);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        let request = AllocationRequest {
            employee_id: employee,
            currency: Currency::Inr,
            amount: Decimal::new(requested_raw, 2),
            project_id: Some(project),
            cost_centre_id: Some(cost_centre),
            exclude: vec![],
        };
        let plan = AllocationEngine::plan(&request, &fleet, now);

        for line in &plan.lines {
            let drawn_voucher = fleet.iter().find(|v| v.id == line.voucher_id).unwrap();
            for older in &fleet {
                let same_tier = AllocationEngine::tier_of(older, &request) == Some(line.tier);
                let strictly_older = (older.created_at, older.id.into_inner())
                    < (drawn_voucher.created_at, drawn_voucher.id.into_inner());
                if same_tier && strictly_older {
                    let drawn: Decimal = plan
                        .lines
                        .iter()
                        .filter(|l| l.voucher_id == older.id)
                        .map(|l| l.amount)
                        .sum();
                    prop_assert_eq!(drawn, older.remaining, "older voucher skipped");
                }
            }
        }
    }
}
