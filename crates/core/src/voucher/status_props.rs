//! Property tests for the voucher status function and conservation invariant.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use advara_shared::types::{CompanyId, EmployeeId};
use advara_shared::types::money::Currency;

use super::types::{Voucher, VoucherScope, VoucherStatus, derive_status};

/// One random balance mutation.
#[derive(Debug, Clone)]
enum Op {
    Use(Decimal),
    Release(Decimal),
    Return(Decimal),
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=20_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        amount_strategy().prop_map(Op::Use),
        amount_strategy().prop_map(Op::Release),
        amount_strategy().prop_map(Op::Return),
    ]
}

fn fresh_voucher(total: Decimal) -> Voucher {
    Voucher::issue(
        CompanyId::new(),
        EmployeeId::new(),
        total,
        Currency::Inr,
        VoucherScope::unscoped(),
        None,
        None,
        Utc::now(),
    )
    .unwrap()
}

fn status_strategy() -> impl Strategy<Value = VoucherStatus> {
    prop_oneof![
        Just(VoucherStatus::Active),
        Just(VoucherStatus::Partial),
        Just(VoucherStatus::Exhausted),
        Just(VoucherStatus::Returned),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any sequence of apply/reverse/return operations, the conservation
    /// invariant `remaining == total - used - returned` and
    /// `0 <= remaining <= total` holds after every step, successful or not.
    #[test]
    fn prop_conservation_invariant_under_random_ops(
        total in (100i64..=50_000i64).prop_map(|n| Decimal::new(n, 2)),
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut voucher = fresh_voucher(total);

        for op in ops {
            // Failed operations must leave the voucher untouched; either way
            // the invariant holds after the call.
            match op {
                Op::Use(amount) => {
                    let _ = voucher.record_use(amount);
                }
                Op::Release(amount) => voucher.release_use(amount),
                Op::Return(amount) => {
                    let _ = voucher.record_return(amount);
                }
            }
            prop_assert!(
                voucher.invariant_holds(),
                "invariant broken: total={} used={} returned={} remaining={}",
                voucher.total, voucher.used, voucher.returned, voucher.remaining
            );
        }
    }

    /// The status function is total and consistent with the balances.
    #[test]
    fn prop_status_matches_balances(
        total in (1i64..=50_000i64).prop_map(|n| Decimal::new(n, 2)),
        used_raw in 0i64..=50_000i64,
        current in status_strategy(),
    ) {
        let used = Decimal::new(used_raw, 2).min(total);
        let status = derive_status(total, used, Decimal::ZERO, current);

        if current == VoucherStatus::Returned {
            prop_assert_eq!(status, VoucherStatus::Returned);
        } else if used == total {
            prop_assert_eq!(status, VoucherStatus::Exhausted);
        } else if used > Decimal::ZERO {
            prop_assert_eq!(status, VoucherStatus::Partial);
        } else {
            prop_assert_eq!(status, VoucherStatus::Active);
        }
    }

    /// A failed draw (over-remaining) never changes state.
    #[test]
    fn prop_failed_use_leaves_state_unchanged(
        total in (100i64..=10_000i64).prop_map(|n| Decimal::new(n, 2)),
        excess in (1i64..=10_000i64).prop_map(|n| Decimal::new(n, 2)),
    ) {
        let mut voucher = fresh_voucher(total);
        let before = voucher.clone();

        prop_assert!(voucher.record_use(total + excess).is_err());
        prop_assert_eq!(voucher, before);
    }

    /// Use followed by release of the same amount is exact (no drift).
    #[test]
    fn prop_use_then_release_is_identity(
        total in (100i64..=50_000i64).prop_map(|n| Decimal::new(n, 2)),
        drawn_raw in 1i64..=50_000i64,
    ) {
        let drawn = Decimal::new(drawn_raw, 2).min(total);
        let mut voucher = fresh_voucher(total);
        let before = voucher.clone();

        voucher.record_use(drawn).unwrap();
        voucher.release_use(drawn);

        prop_assert_eq!(voucher.used, before.used);
        prop_assert_eq!(voucher.remaining, before.remaining);
        prop_assert_eq!(voucher.status, before.status);
    }
}
