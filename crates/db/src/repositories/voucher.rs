//! Voucher repository.
//!
//! Owns the model/domain conversions for vouchers and the version-guarded
//! update every mutating repository goes through.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use advara_core::events::{EngineEvent, EventPublisher, NoopPublisher};
use advara_core::journal::{JournalEntryInput, LedgerEntryKind};
use advara_core::voucher::{Voucher, VoucherError, VoucherScope};
use advara_shared::types::money::Currency;
use advara_shared::types::{CompanyId, CostCentreId, EmployeeId, ProjectId, VoucherId};
use rust_decimal::Decimal;

use crate::entities::vouchers;

use super::RepoError;
use super::ledger::LedgerRepository;

/// Input for issuing a voucher.
#[derive(Debug, Clone)]
pub struct IssueVoucherInput {
    /// Owning company.
    pub company_id: CompanyId,
    /// Employee the balance is issued to.
    pub employee_id: EmployeeId,
    /// Issued amount.
    pub total: Decimal,
    /// Currency of the voucher.
    pub currency: Currency,
    /// Optional human-readable code.
    pub code: Option<String>,
    /// Optional project restriction.
    pub project_id: Option<ProjectId>,
    /// Optional cost-centre restriction.
    pub cost_centre_id: Option<CostCentreId>,
    /// Optional expiry.
    pub expires_at: Option<chrono::DateTime<Utc>>,
}

/// Voucher repository for persistence of voucher state.
pub struct VoucherRepository {
    db: DatabaseConnection,
    events: Arc<dyn EventPublisher>,
}

impl VoucherRepository {
    /// Creates a new voucher repository with no event bus wired.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            events: Arc::new(NoopPublisher),
        }
    }

    /// Creates a repository publishing to the given bus after commit.
    #[must_use]
    pub fn with_events(db: DatabaseConnection, events: Arc<dyn EventPublisher>) -> Self {
        Self { db, events }
    }

    /// Issues a new voucher and appends its issuance journal entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the total is not positive or the insert fails.
    pub async fn issue(&self, input: IssueVoucherInput) -> Result<Voucher, RepoError> {
        let now = Utc::now();
        let scope = VoucherScope {
            project_id: input.project_id,
            cost_centre_id: input.cost_centre_id,
        };
        let voucher = Voucher::issue(
            input.company_id,
            input.employee_id,
            input.total,
            input.currency,
            scope,
            input.code,
            input.expires_at,
            now,
        )?;

        let txn = self.db.begin().await?;
        active_from_domain(&voucher).insert(&txn).await?;
        txn.commit().await?;

        // Journal append is best-effort after commit; the voucher row is the
        // source of truth for balances.
        let entry = JournalEntryInput::for_voucher(
            LedgerEntryKind::Issued,
            &voucher,
            None,
            voucher.total,
            "Advance voucher issued".to_string(),
            now.date_naive(),
        );
        if let Err(err) = LedgerRepository::new(self.db.clone()).append(&entry).await {
            tracing::warn!(voucher_id = %voucher.id, error = %err, "issuance journal append failed");
        }
        let event = EngineEvent::VoucherIssued {
            voucher_id: voucher.id,
            employee_id: voucher.employee_id,
            amount: voucher.total,
            currency: voucher.currency,
        };
        if let Err(err) = self.events.publish(&event) {
            tracing::warn!(voucher_id = %voucher.id, error = %err, "event publish failed");
        }

        Ok(voucher)
    }

    /// Finds a voucher by id, scoped to a company.
    ///
    /// # Errors
    ///
    /// Returns `VoucherNotFound` if no matching voucher exists.
    pub async fn find(
        &self,
        company_id: CompanyId,
        voucher_id: VoucherId,
    ) -> Result<Voucher, RepoError> {
        let model = vouchers::Entity::find_by_id(voucher_id.into_inner())
            .filter(vouchers::Column::CompanyId.eq(company_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(VoucherError::VoucherNotFound(voucher_id))?;
        to_domain(&model)
    }

    /// Loads the allocation candidates for one employee in one currency,
    /// oldest first. The allocation engine applies the full eligibility
    /// filter; this query only narrows to rows that could possibly qualify.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be mapped.
    pub async fn candidates_for(
        &self,
        employee_id: EmployeeId,
        currency: Currency,
    ) -> Result<Vec<Voucher>, RepoError> {
        let models = vouchers::Entity::find()
            .filter(vouchers::Column::EmployeeId.eq(employee_id.into_inner()))
            .filter(vouchers::Column::Currency.eq(currency.to_string()))
            .filter(vouchers::Column::Remaining.gt(Decimal::ZERO))
            .order_by_asc(vouchers::Column::CreatedAt)
            .order_by_asc(vouchers::Column::Id)
            .all(&self.db)
            .await?;

        models.iter().map(to_domain).collect()
    }

    /// Loads every voucher of a company (dashboard reads).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be mapped.
    pub async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<Voucher>, RepoError> {
        let models = vouchers::Entity::find()
            .filter(vouchers::Column::CompanyId.eq(company_id.into_inner()))
            .order_by_asc(vouchers::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.iter().map(to_domain).collect()
    }

    /// Writes a mutated voucher back, guarded by its optimistic version.
    ///
    /// The UPDATE matches on `(id, version)`; zero rows affected means a
    /// concurrent writer committed first, reported as `VersionMismatch` so
    /// the caller can retry against a fresh read.
    ///
    /// # Errors
    ///
    /// Returns `VersionMismatch` on a lost race, `VoucherNotFound` if the
    /// row vanished, or a database error.
    pub async fn update_with_version<C: ConnectionTrait>(
        conn: &C,
        voucher: &Voucher,
        expected_version: i64,
    ) -> Result<(), RepoError> {
        let update = vouchers::ActiveModel {
            used: Set(voucher.used),
            returned: Set(voucher.returned),
            remaining: Set(voucher.remaining),
            status: Set(voucher.status.into()),
            version: Set(expected_version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let result = vouchers::Entity::update_many()
            .set(update)
            .filter(vouchers::Column::Id.eq(voucher.id.into_inner()))
            .filter(vouchers::Column::Version.eq(expected_version))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let actual = vouchers::Entity::find_by_id(voucher.id.into_inner())
                .one(conn)
                .await?
                .ok_or(VoucherError::VoucherNotFound(voucher.id))?
                .version;
            return Err(VoucherError::VersionMismatch {
                voucher_id: voucher.id,
                expected: expected_version,
                actual,
            }
            .into());
        }
        Ok(())
    }
}

/// Maps a stored row back to the domain voucher.
pub(crate) fn to_domain(model: &vouchers::Model) -> Result<Voucher, RepoError> {
    let currency = Currency::from_str(&model.currency).map_err(RepoError::Corrupt)?;

    Ok(Voucher {
        id: VoucherId::from_uuid(model.id),
        company_id: CompanyId::from_uuid(model.company_id),
        employee_id: EmployeeId::from_uuid(model.employee_id),
        code: model.code.clone(),
        currency,
        total: model.total,
        used: model.used,
        returned: model.returned,
        remaining: model.remaining,
        scope: VoucherScope {
            project_id: model.project_id.map(ProjectId::from_uuid),
            cost_centre_id: model.cost_centre_id.map(CostCentreId::from_uuid),
        },
        expires_at: model.expires_at.map(|t| t.with_timezone(&Utc)),
        status: model.status.clone().into(),
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

/// Builds the insert model for a freshly issued voucher.
pub(crate) fn active_from_domain(voucher: &Voucher) -> vouchers::ActiveModel {
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    vouchers::ActiveModel {
        id: Set(voucher.id.into_inner()),
        company_id: Set(voucher.company_id.into_inner()),
        employee_id: Set(voucher.employee_id.into_inner()),
        code: Set(voucher.code.clone()),
        currency: Set(voucher.currency.to_string()),
        total: Set(voucher.total),
        used: Set(voucher.used),
        returned: Set(voucher.returned),
        remaining: Set(voucher.remaining),
        project_id: Set(voucher.scope.project_id.map(ProjectId::into_inner)),
        cost_centre_id: Set(voucher.scope.cost_centre_id.map(CostCentreId::into_inner)),
        expires_at: Set(voucher.expires_at.map(Into::into)),
        status: Set(voucher.status.into()),
        version: Set(voucher.version),
        created_at: Set(voucher.created_at.into()),
        updated_at: Set(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advara_core::voucher::VoucherStatus;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::entities::sea_orm_active_enums;

    fn model() -> vouchers::Model {
        vouchers::Model {
            id: Uuid::now_v7(),
            company_id: Uuid::now_v7(),
            employee_id: Uuid::now_v7(),
            code: Some("ADV-2026-0007".to_string()),
            currency: "INR".to_string(),
            total: dec!(500),
            used: dec!(120),
            returned: dec!(50),
            remaining: dec!(330),
            project_id: Some(Uuid::now_v7()),
            cost_centre_id: None,
            expires_at: None,
            status: sea_orm_active_enums::VoucherStatus::Partial,
            version: 3,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_to_domain_maps_balances_and_scope() {
        let row = model();
        let voucher = to_domain(&row).unwrap();

        assert_eq!(voucher.id.into_inner(), row.id);
        assert_eq!(voucher.currency, Currency::Inr);
        assert_eq!(voucher.total, dec!(500));
        assert_eq!(voucher.remaining, dec!(330));
        assert_eq!(voucher.scope.project_id.map(ProjectId::into_inner), row.project_id);
        assert_eq!(voucher.status, VoucherStatus::Partial);
        assert_eq!(voucher.version, 3);
        assert!(voucher.invariant_holds());
    }

    #[test]
    fn test_to_domain_rejects_unknown_currency() {
        let mut row = model();
        row.currency = "XYZ".to_string();

        assert!(matches!(to_domain(&row), Err(RepoError::Corrupt(_))));
    }

    #[test]
    fn test_insert_model_carries_domain_values() {
        let voucher = to_domain(&model()).unwrap();
        let active = active_from_domain(&voucher);

        assert_eq!(active.id.unwrap(), voucher.id.into_inner());
        assert_eq!(active.currency.unwrap(), "INR");
        assert_eq!(active.remaining.unwrap(), dec!(330));
        assert_eq!(
            active.status.unwrap(),
            sea_orm_active_enums::VoucherStatus::Partial
        );
        assert_eq!(active.version.unwrap(), 3);
    }
}
