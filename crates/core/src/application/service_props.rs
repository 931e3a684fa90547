//! Property tests for multi-voucher application.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use advara_shared::types::{CompanyId, EmployeeId, ReportId};
use advara_shared::types::money::Currency;

use crate::voucher::{Voucher, VoucherScope};

use super::service::ApplicationService;
use super::types::{ReportSnapshot, ShortfallPolicy};

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=50_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn wallet_strategy(employee: EmployeeId) -> impl Strategy<Value = Vec<Voucher>> {
    prop::collection::vec((1i64..=20_000i64, 0i64..=365i64), 1..8).prop_map(move |specs| {
        let now = Utc::now();
        specs
            .into_iter()
            .map(|(cents, age_days)| {
                Voucher::issue(
                    CompanyId::new(),
                    employee,
                    Decimal::new(cents, 2),
                    Currency::Inr,
                    VoucherScope::unscoped(),
                    None,
                    None,
                    now - Duration::days(age_days),
                )
                .unwrap()
            })
            .collect()
    })
}

fn report_for(owner: EmployeeId) -> ReportSnapshot {
    ReportSnapshot {
        id: ReportId::new(),
        owner_id: owner,
        editable: true,
        project_id: None,
        cost_centre_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A successful allocation draws exactly the requested amount, spread
    /// over usages that each respect their voucher's balance, and every
    /// post-apply voucher still satisfies the conservation invariant.
    #[test]
    fn prop_allocation_is_exact_and_conserving(
        amount in amount_strategy(),
    ) {
        let employee = EmployeeId::new();
        let now = Utc::now();
        let wallet = vec![
            Voucher::issue(CompanyId::new(), employee, amount * Decimal::TWO, Currency::Inr,
                VoucherScope::unscoped(), None, None, now).unwrap(),
        ];
        let report = report_for(employee);

        let outcome = ApplicationService::apply_allocation(
            &wallet, &report, None, amount, Currency::Inr, employee,
            ShortfallPolicy::Reject, now,
        ).unwrap();

        let usage_sum: Decimal = outcome.outcomes.iter().map(|o| o.usage.amount).sum();
        prop_assert_eq!(usage_sum, amount);
        prop_assert_eq!(outcome.transaction.total, amount);
        prop_assert_eq!(outcome.shortfall, Decimal::ZERO);
        for o in &outcome.outcomes {
            prop_assert!(o.voucher.invariant_holds());
            prop_assert!(o.usage.amount > Decimal::ZERO);
            prop_assert!(o.usage.amount <= o.voucher.total);
        }
    }

    /// Across arbitrary wallets, the allocation either covers the full
    /// request or fails under the reject policy; it never partially
    /// succeeds silently.
    #[test]
    fn prop_reject_policy_is_all_or_nothing(
        amount in amount_strategy(),
        wallet in wallet_strategy(EmployeeId::new()),
    ) {
        let employee = wallet[0].employee_id;
        let report = report_for(employee);
        let now = Utc::now();
        let available: Decimal = wallet.iter().map(|v| v.remaining).sum();

        let result = ApplicationService::apply_allocation(
            &wallet, &report, None, amount, Currency::Inr, employee,
            ShortfallPolicy::Reject, now,
        );

        if amount <= available {
            let outcome = result.unwrap();
            let usage_sum: Decimal = outcome.outcomes.iter().map(|o| o.usage.amount).sum();
            prop_assert_eq!(usage_sum, amount);
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Under the partial policy the funded amount is exactly
    /// `min(requested, available)` whenever anything is available.
    #[test]
    fn prop_partial_policy_funds_min_of_requested_and_available(
        amount in amount_strategy(),
        wallet in wallet_strategy(EmployeeId::new()),
    ) {
        let employee = wallet[0].employee_id;
        let report = report_for(employee);
        let now = Utc::now();
        let available: Decimal = wallet.iter().map(|v| v.remaining).sum();

        let outcome = ApplicationService::apply_allocation(
            &wallet, &report, None, amount, Currency::Inr, employee,
            ShortfallPolicy::Partial, now,
        ).unwrap();

        prop_assert_eq!(outcome.transaction.total, amount.min(available));
        prop_assert_eq!(outcome.shortfall, (amount - available).max(Decimal::ZERO));
    }

    /// Usages drain wallets oldest-first: the applied vouchers, in outcome
    /// order, are non-decreasing in issuance time.
    #[test]
    fn prop_allocation_order_is_fifo(
        amount in amount_strategy(),
        wallet in wallet_strategy(EmployeeId::new()),
    ) {
        let employee = wallet[0].employee_id;
        let report = report_for(employee);
        let now = Utc::now();

        if let Ok(outcome) = ApplicationService::apply_allocation(
            &wallet, &report, None, amount, Currency::Inr, employee,
            ShortfallPolicy::Partial, now,
        ) {
            let times: Vec<_> = outcome
                .outcomes
                .iter()
                .map(|o| o.voucher.created_at)
                .collect();
            prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
