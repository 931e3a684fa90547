//! Company dashboard rollups.

use sea_orm::DatabaseConnection;

use advara_core::dashboard::{CompanyDashboard, DashboardAggregator};
use advara_shared::types::CompanyId;
use advara_shared::types::money::Currency;

use super::RepoError;
use super::voucher::VoucherRepository;

/// Read-side repository computing dashboard rollups from live rows.
///
/// Aggregation happens in memory so the numbers always match what the
/// conservation checks guard. A materialised view is unnecessary at the
/// row counts a single company produces.
pub struct DashboardRepository {
    db: DatabaseConnection,
}

impl DashboardRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Company-wide totals, status counts, and per-employee rollups for
    /// one currency.
    ///
    /// # Errors
    ///
    /// Returns a database error, or `Corrupt` when a stored row no longer
    /// parses.
    pub async fn company_dashboard(
        &self,
        company_id: CompanyId,
        currency: Currency,
    ) -> Result<CompanyDashboard, RepoError> {
        let vouchers = VoucherRepository::new(self.db.clone())
            .list_for_company(company_id)
            .await?;
        Ok(DashboardAggregator::company_dashboard(
            company_id, currency, &vouchers,
        ))
    }
}
