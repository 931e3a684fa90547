//! Application repository.
//!
//! Pairs the pure `ApplicationService` with transactional persistence: the
//! core computes which vouchers fund a report and by how much, this
//! repository commits the voucher updates, usage rows, and the allocation
//! record in one database transaction. Journal entries and events go out
//! best-effort after commit.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use rust_decimal::Decimal;

use advara_core::application::{
    AllocationApplyOutcome, ApplicationService, ApplyOutcome, ReportSnapshot, ShortfallPolicy,
};
use advara_core::audit::{AuditRecord, AuditSink, NoopAudit};
use advara_core::events::{EngineEvent, EventPublisher, NoopPublisher};
use advara_core::voucher::{Voucher, VoucherError};
use advara_shared::types::money::Currency;
use advara_shared::types::{EmployeeId, ExpenseId, ReportId, VoucherId};
use uuid::Uuid;

use crate::entities::{allocation_lines, allocation_transactions, voucher_usages};

use super::RepoError;
use super::ledger::LedgerRepository;
use super::voucher::VoucherRepository;

/// Input for funding a report from an employee's vouchers.
#[derive(Debug, Clone)]
pub struct ApplyToReportInput {
    /// The report, as snapshotted by the report lifecycle driver.
    pub report: ReportSnapshot,
    /// The expense line being funded, when deduction is expense-level.
    pub expense_id: Option<ExpenseId>,
    /// Amount to fund.
    pub amount: Decimal,
    /// Currency of the funding.
    pub currency: Currency,
    /// The acting employee.
    pub actor: EmployeeId,
    /// What to do when the vouchers cannot cover the amount.
    pub policy: ShortfallPolicy,
}

/// Application repository.
pub struct ApplicationRepository {
    db: DatabaseConnection,
    events: Arc<dyn EventPublisher>,
    audit: Arc<dyn AuditSink>,
}

impl ApplicationRepository {
    /// Creates a repository with no event bus or audit sink wired.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            events: Arc::new(NoopPublisher),
            audit: Arc::new(NoopAudit),
        }
    }

    /// Creates a repository delivering to the given side channels after
    /// commit.
    #[must_use]
    pub fn with_sinks(
        db: DatabaseConnection,
        events: Arc<dyn EventPublisher>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { db, events, audit }
    }

    /// Funds a report from the actor's vouchers and commits everything
    /// atomically.
    ///
    /// Vouchers already applied to this report are excluded from the plan,
    /// so a partial re-delivery doesn't double-draw. The voucher updates are
    /// version-guarded; a lost race surfaces as a retryable
    /// `VersionMismatch`.
    ///
    /// # Errors
    ///
    /// Returns domain validation failures from the core service, or a
    /// database error. On any error nothing is committed.
    pub async fn apply_to_report(
        &self,
        input: ApplyToReportInput,
    ) -> Result<AllocationApplyOutcome, RepoError> {
        let now = Utc::now();
        let voucher_repo = VoucherRepository::new(self.db.clone());

        let mut candidates = voucher_repo
            .candidates_for(input.actor, input.currency)
            .await?;
        let already_applied = self.applied_voucher_ids(input.report.id).await?;
        candidates.retain(|v| !already_applied.contains(&v.id));

        let outcome = ApplicationService::apply_allocation(
            &candidates,
            &input.report,
            input.expense_id,
            input.amount,
            input.currency,
            input.actor,
            input.policy,
            now,
        )?;

        let txn = self.db.begin().await?;
        for apply in &outcome.outcomes {
            self.persist_apply(&txn, apply, &candidates).await?;
        }
        self.insert_allocation_record(&txn, &outcome).await?;
        txn.commit().await?;

        self.post_commit(&outcome).await;
        Ok(outcome)
    }

    /// Voucher ids with a live usage on this report.
    async fn applied_voucher_ids(
        &self,
        report_id: ReportId,
    ) -> Result<Vec<VoucherId>, RepoError> {
        let rows = voucher_usages::Entity::find()
            .filter(voucher_usages::Column::ReportId.eq(report_id.into_inner()))
            .filter(
                voucher_usages::Column::Status
                    .eq(crate::entities::sea_orm_active_enums::UsageStatus::Applied),
            )
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| VoucherId::from_uuid(r.voucher_id))
            .collect())
    }

    /// Persists one apply outcome: version-guarded voucher update plus the
    /// usage row. The partial unique index on `(voucher_id, report_id)`
    /// backs the duplicate check under concurrency.
    async fn persist_apply(
        &self,
        txn: &DatabaseTransaction,
        apply: &ApplyOutcome,
        candidates: &[Voucher],
    ) -> Result<(), RepoError> {
        let expected_version = candidates
            .iter()
            .find(|v| v.id == apply.voucher.id)
            .map_or(apply.voucher.version, |v| v.version);
        VoucherRepository::update_with_version(txn, &apply.voucher, expected_version).await?;

        let usage = &apply.usage;
        voucher_usages::ActiveModel {
            id: Set(usage.id.into_inner()),
            voucher_id: Set(usage.voucher_id.into_inner()),
            report_id: Set(usage.report_id.into_inner()),
            employee_id: Set(usage.employee_id.into_inner()),
            amount: Set(usage.amount),
            currency: Set(usage.currency.to_string()),
            status: Set(usage.status.into()),
            applied_by: Set(usage.applied_by.into_inner()),
            applied_at: Set(usage.applied_at.into()),
            reversed_by: Set(None),
            reversed_at: Set(None),
            reversal_reason: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(txn)
        .await
        .map_err(|err| map_unique_violation(err, usage.voucher_id, usage.report_id))?;

        Ok(())
    }

    /// Inserts the allocation transaction and its ordered lines.
    ///
    /// The unique indexes on `(report_id)` and `(report_id, expense_id)`
    /// reject a second funding of the same target; that violation comes
    /// back as `AlreadyApplied` rather than a raw database error.
    async fn insert_allocation_record(
        &self,
        txn: &DatabaseTransaction,
        outcome: &AllocationApplyOutcome,
    ) -> Result<(), RepoError> {
        let record = &outcome.transaction;
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        allocation_transactions::ActiveModel {
            id: Set(record.id.into_inner()),
            company_id: Set(record.company_id.into_inner()),
            employee_id: Set(record.employee_id.into_inner()),
            report_id: Set(record.report_id.into_inner()),
            expense_id: Set(record.expense_id.map(ExpenseId::into_inner)),
            total: Set(record.total),
            currency: Set(record.currency.to_string()),
            created_at: Set(record.created_at.into()),
        }
        .insert(txn)
        .await
        .map_err(|err| map_duplicate_funding(err, outcome))?;

        for (position, line) in record.lines.iter().enumerate() {
            allocation_lines::ActiveModel {
                id: Set(Uuid::now_v7()),
                allocation_id: Set(record.id.into_inner()),
                voucher_id: Set(line.voucher_id.into_inner()),
                amount: Set(line.amount),
                tier: Set(line.tier.into()),
                position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
                created_at: Set(now),
            }
            .insert(txn)
            .await?;
        }

        Ok(())
    }

    /// Best-effort journal, event, and audit delivery after commit.
    async fn post_commit(&self, outcome: &AllocationApplyOutcome) {
        let ledger = LedgerRepository::new(self.db.clone());
        for apply in &outcome.outcomes {
            if let Err(err) = ledger.append(&apply.journal).await {
                tracing::warn!(
                    voucher_id = %apply.voucher.id,
                    error = %err,
                    "usage journal append failed"
                );
            }
            let event = EngineEvent::VoucherApplied {
                voucher_id: apply.voucher.id,
                report_id: apply.usage.report_id,
                amount: apply.usage.amount,
                currency: apply.usage.currency,
            };
            if let Err(err) = self.events.publish(&event) {
                tracing::warn!(voucher_id = %apply.voucher.id, error = %err, "event publish failed");
            }
            let record = AuditRecord {
                company_id: apply.voucher.company_id,
                actor_id: apply.usage.applied_by,
                action: "voucher.apply",
                entity_type: "voucher",
                entity_id: apply.voucher.id.into_inner(),
                details: serde_json::json!({
                    "report_id": apply.usage.report_id,
                    "amount": apply.usage.amount,
                    "currency": apply.usage.currency,
                }),
                occurred_at: apply.usage.applied_at,
            };
            if let Err(err) = self.audit.record(&record) {
                tracing::warn!(voucher_id = %apply.voucher.id, error = %err, "audit record failed");
            }
        }
    }
}

/// Maps a unique violation on a funding table to the domain conflict on the
/// given voucher/report pair. Anything else stays a database error.
fn map_unique_violation(err: DbErr, voucher_id: VoucherId, report_id: ReportId) -> RepoError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return duplicate_funding(voucher_id, report_id);
    }
    RepoError::Database(err)
}

/// Maps a unique violation on the allocation record to the conflict on the
/// first drawn voucher.
fn map_duplicate_funding(err: DbErr, outcome: &AllocationApplyOutcome) -> RepoError {
    match outcome.outcomes.first() {
        Some(apply) => {
            map_unique_violation(err, apply.voucher.id, outcome.transaction.report_id)
        }
        None => RepoError::Database(err),
    }
}

fn duplicate_funding(voucher_id: VoucherId, report_id: ReportId) -> RepoError {
    VoucherError::AlreadyApplied {
        voucher_id,
        report_id,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_funding_surfaces_as_already_applied() {
        let voucher_id = VoucherId::new();
        let report_id = ReportId::new();

        let err = duplicate_funding(voucher_id, report_id);

        assert!(matches!(
            err,
            RepoError::Domain(VoucherError::AlreadyApplied {
                voucher_id: v,
                report_id: r,
            }) if v == voucher_id && r == report_id
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_non_unique_errors_stay_database_errors() {
        let err = map_unique_violation(
            DbErr::Custom("connection reset".into()),
            VoucherId::new(),
            ReportId::new(),
        );

        assert!(matches!(err, RepoError::Database(_)));
    }
}
