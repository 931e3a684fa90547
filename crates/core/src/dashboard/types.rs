//! Dashboard rollup types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use advara_shared::types::{CompanyId, EmployeeId};
use advara_shared::types::money::Currency;

/// Company-wide balance totals in one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Sum of issued voucher totals.
    pub issued: Decimal,
    /// Sum drawn against reports.
    pub used: Decimal,
    /// Sum handed back.
    pub returned: Decimal,
    /// Sum still available.
    pub remaining: Decimal,
}

/// Voucher counts by lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Untouched vouchers.
    pub active: u64,
    /// Partially consumed vouchers.
    pub partial: u64,
    /// Fully drawn vouchers.
    pub exhausted: u64,
    /// Fully returned vouchers.
    pub returned: u64,
}

impl StatusCounts {
    /// Total vouchers counted.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.active + self.partial + self.exhausted + self.returned
    }
}

/// Per-employee consumption rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRollup {
    /// The employee.
    pub employee_id: EmployeeId,
    /// Their balance totals.
    pub totals: BalanceTotals,
    /// How many vouchers they hold (any status).
    pub voucher_count: u64,
}

/// The full per-company, per-currency dashboard.
///
/// Built from an unsynchronized voucher read; figures may trail concurrent
/// writes by a moment, which is acceptable for a reporting surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDashboard {
    /// The company.
    pub company_id: CompanyId,
    /// Currency all figures are denominated in.
    pub currency: Currency,
    /// Company-wide balance totals.
    pub totals: BalanceTotals,
    /// Voucher counts by status.
    pub status_counts: StatusCounts,
    /// Per-employee rollups, largest remaining balance first.
    pub employees: Vec<EmployeeRollup>,
}
