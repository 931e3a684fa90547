//! Pure aggregation over voucher snapshots.

use std::collections::BTreeMap;

use advara_shared::types::{CompanyId, EmployeeId};
use advara_shared::types::money::Currency;

use crate::voucher::{Voucher, VoucherStatus};

use super::types::{BalanceTotals, CompanyDashboard, EmployeeRollup, StatusCounts};

/// Computes dashboard rollups from a slice of voucher snapshots.
///
/// Figures are per-currency; vouchers in other currencies or other
/// companies are skipped rather than summed into nonsense.
pub struct DashboardAggregator;

impl DashboardAggregator {
    /// Builds the company dashboard for one currency.
    #[must_use]
    pub fn company_dashboard(
        company_id: CompanyId,
        currency: Currency,
        vouchers: &[Voucher],
    ) -> CompanyDashboard {
        let mut totals = BalanceTotals::default();
        let mut status_counts = StatusCounts::default();
        let mut by_employee: BTreeMap<EmployeeId, EmployeeRollup> = BTreeMap::new();

        for voucher in vouchers {
            if voucher.company_id != company_id || voucher.currency != currency {
                continue;
            }

            totals.issued += voucher.total;
            totals.used += voucher.used;
            totals.returned += voucher.returned;
            totals.remaining += voucher.remaining;

            match voucher.status {
                VoucherStatus::Active => status_counts.active += 1,
                VoucherStatus::Partial => status_counts.partial += 1,
                VoucherStatus::Exhausted => status_counts.exhausted += 1,
                VoucherStatus::Returned => status_counts.returned += 1,
            }

            let rollup = by_employee
                .entry(voucher.employee_id)
                .or_insert_with(|| EmployeeRollup {
                    employee_id: voucher.employee_id,
                    totals: BalanceTotals::default(),
                    voucher_count: 0,
                });
            rollup.totals.issued += voucher.total;
            rollup.totals.used += voucher.used;
            rollup.totals.returned += voucher.returned;
            rollup.totals.remaining += voucher.remaining;
            rollup.voucher_count += 1;
        }

        let mut employees: Vec<EmployeeRollup> = by_employee.into_values().collect();
        employees.sort_by(|a, b| {
            b.totals
                .remaining
                .cmp(&a.totals.remaining)
                .then_with(|| a.employee_id.cmp(&b.employee_id))
        });

        CompanyDashboard {
            company_id,
            currency,
            totals,
            status_counts,
            employees,
        }
    }
}

impl BalanceTotals {
    /// The conservation invariant, lifted to the rollup.
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        self.remaining == self.issued - self.used - self.returned
    }
}
