//! Read-only dashboard rollups over voucher snapshots.

pub mod aggregate;
pub mod types;

pub use aggregate::DashboardAggregator;
pub use types::{BalanceTotals, CompanyDashboard, EmployeeRollup, StatusCounts};
