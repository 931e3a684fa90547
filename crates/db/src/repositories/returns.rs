//! Return workflow repository.
//!
//! Persists the request/review flow and the direct admin return. The
//! partial unique index on pending requests backs the one-pending-per-
//! voucher rule under concurrency; the repository's pre-flight query is the
//! friendly-error path.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use rust_decimal::Decimal;

use advara_core::audit::{AuditRecord, AuditSink, NoopAudit};
use advara_core::events::{EngineEvent, EventPublisher, NoopPublisher};
use advara_core::returns::{ReturnOutcome, ReturnRequest, ReturnRequestStatus, ReturnService};
use advara_shared::types::money::Currency;
use advara_shared::types::{CompanyId, EmployeeId, ReturnRequestId, VoucherId};
use advara_core::voucher::VoucherError;

use crate::entities::{return_requests, sea_orm_active_enums};

use super::RepoError;
use super::ledger::LedgerRepository;
use super::voucher::VoucherRepository;

/// Return workflow repository.
pub struct ReturnRepository {
    db: DatabaseConnection,
    events: Arc<dyn EventPublisher>,
    audit: Arc<dyn AuditSink>,
}

impl ReturnRepository {
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

    /// Opens a return request for part of a voucher's balance.
    ///
    /// # Errors
    ///
    /// Returns domain validation failures, `PendingRequestExists` when a
    /// request is already awaiting review, or a database error.
    pub async fn request(
        &self,
        company_id: CompanyId,
        voucher_id: VoucherId,
        amount: Decimal,
        actor: EmployeeId,
        reason: Option<String>,
    ) -> Result<ReturnRequest, RepoError> {
        let now = Utc::now();
        let voucher = VoucherRepository::new(self.db.clone())
            .find(company_id, voucher_id)
            .await?;
        let pending_exists = self.pending_request_for(voucher_id).await?.is_some();

        let request =
            ReturnService::request_return(&voucher, amount, actor, reason, pending_exists, now)?;

        return_requests::ActiveModel {
            id: Set(request.id.into_inner()),
            voucher_id: Set(request.voucher_id.into_inner()),
            employee_id: Set(request.employee_id.into_inner()),
            amount: Set(request.amount),
            currency: Set(request.currency.to_string()),
            status: Set(request.status.into()),
            reason: Set(request.reason.clone()),
            requested_at: Set(request.requested_at.into()),
            decided_by: Set(None),
            decided_at: Set(None),
            decision_note: Set(None),
            created_at: Set(now.into()),
        }
        .insert(&self.db)
        .await?;

        Ok(request)
    }

    /// Approves a pending request and books the return.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` / `RequestNotPending` / balance errors
    /// from the core service, `VersionMismatch` on a lost race, or a
    /// database error.
    pub async fn approve(
        &self,
        company_id: CompanyId,
        request_id: ReturnRequestId,
        reviewer: EmployeeId,
        note: Option<String>,
    ) -> Result<ReturnOutcome, RepoError> {
        let now = Utc::now();
        let request = self.find_request(request_id).await?;
        let voucher = VoucherRepository::new(self.db.clone())
            .find(company_id, request.voucher_id)
            .await?;

        let outcome = ReturnService::approve(&voucher, &request, reviewer, note, now)?;

        let txn = self.db.begin().await?;
        VoucherRepository::update_with_version(&txn, &outcome.voucher, voucher.version).await?;
        if let Some(decided) = &outcome.request {
            Self::update_request(&txn, decided).await?;
        }
        txn.commit().await?;

        self.post_commit(&outcome, reviewer, "return.approve", now).await;
        Ok(outcome)
    }

    /// Rejects a pending request, leaving the voucher untouched.
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` / `RequestNotPending`, or a database
    /// error.
    pub async fn reject(
        &self,
        request_id: ReturnRequestId,
        reviewer: EmployeeId,
        note: Option<String>,
    ) -> Result<ReturnRequest, RepoError> {
        let now = Utc::now();
        let request = self.find_request(request_id).await?;
        let decided = ReturnService::reject(&request, reviewer, note, now)?;

        let txn = self.db.begin().await?;
        Self::update_request(&txn, &decided).await?;
        txn.commit().await?;

        Ok(decided)
    }

    /// Books a return directly, clamped to the remaining balance.
    ///
    /// # Errors
    ///
    /// Returns domain validation failures, `VersionMismatch` on a lost
    /// race, or a database error.
    pub async fn direct_return(
        &self,
        company_id: CompanyId,
        voucher_id: VoucherId,
        amount: Decimal,
        actor: EmployeeId,
    ) -> Result<ReturnOutcome, RepoError> {
        let now = Utc::now();
        let voucher = VoucherRepository::new(self.db.clone())
            .find(company_id, voucher_id)
            .await?;

        let outcome = ReturnService::direct_return(&voucher, amount, actor, now)?;

        let txn = self.db.begin().await?;
        VoucherRepository::update_with_version(&txn, &outcome.voucher, voucher.version).await?;
        txn.commit().await?;

        self.post_commit(&outcome, actor, "return.direct", now).await;
        Ok(outcome)
    }

    /// The voucher's pending request, if one exists.
    async fn pending_request_for(
        &self,
        voucher_id: VoucherId,
    ) -> Result<Option<return_requests::Model>, RepoError> {
        let row = return_requests::Entity::find()
            .filter(return_requests::Column::VoucherId.eq(voucher_id.into_inner()))
            .filter(
                return_requests::Column::Status
                    .eq(sea_orm_active_enums::ReturnRequestStatus::Pending),
            )
            .one(&self.db)
            .await?;
        Ok(row)
    }

    async fn find_request(&self, request_id: ReturnRequestId) -> Result<ReturnRequest, RepoError> {
        let model = return_requests::Entity::find_by_id(request_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(VoucherError::RequestNotFound(request_id))?;
        request_to_domain(&model)
    }

    /// Writes a decided request's review fields back.
    ///
    /// The UPDATE matches only a still-pending row, mirroring the voucher
    /// version guard: if a concurrent reviewer decided first, zero rows
    /// match and this decision fails with `RequestNotPending` instead of
    /// overwriting a committed one.
    async fn update_request(
        txn: &DatabaseTransaction,
        request: &ReturnRequest,
    ) -> Result<(), RepoError> {
        let update = return_requests::ActiveModel {
            status: Set(request.status.into()),
            decided_by: Set(request.decided_by.map(EmployeeId::into_inner)),
            decided_at: Set(request.decided_at.map(Into::into)),
            decision_note: Set(request.decision_note.clone()),
            ..Default::default()
        };
        let result = return_requests::Entity::update_many()
            .set(update)
            .filter(return_requests::Column::Id.eq(request.id.into_inner()))
            .filter(
                return_requests::Column::Status
                    .eq(sea_orm_active_enums::ReturnRequestStatus::Pending),
            )
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(VoucherError::RequestNotPending(request.id).into());
        }
        Ok(())
    }

    /// Best-effort journal, event, and audit delivery after commit.
    async fn post_commit(
        &self,
        outcome: &ReturnOutcome,
        actor: EmployeeId,
        action: &'static str,
        now: chrono::DateTime<Utc>,
    ) {
        if let Err(err) = LedgerRepository::new(self.db.clone())
            .append(&outcome.journal)
            .await
        {
            tracing::warn!(
                voucher_id = %outcome.voucher.id,
                error = %err,
                "return journal append failed"
            );
        }
        let event = EngineEvent::BalanceReturned {
            voucher_id: outcome.voucher.id,
            request_id: outcome.request.as_ref().map(|r| r.id),
            amount: outcome.journal.amount,
            currency: outcome.voucher.currency,
        };
        if let Err(err) = self.events.publish(&event) {
            tracing::warn!(voucher_id = %outcome.voucher.id, error = %err, "event publish failed");
        }
        let record = AuditRecord {
            company_id: outcome.voucher.company_id,
            actor_id: actor,
            action,
            entity_type: "voucher",
            entity_id: outcome.voucher.id.into_inner(),
            details: serde_json::json!({
                "request_id": outcome.request.as_ref().map(|r| r.id),
                "amount": outcome.journal.amount,
                "currency": outcome.voucher.currency,
            }),
            occurred_at: now,
        };
        if let Err(err) = self.audit.record(&record) {
            tracing::warn!(voucher_id = %outcome.voucher.id, error = %err, "audit record failed");
        }
    }
}

/// Maps a stored request row back to the domain type.
fn request_to_domain(model: &return_requests::Model) -> Result<ReturnRequest, RepoError> {
    let currency = Currency::from_str(&model.currency).map_err(RepoError::Corrupt)?;
    let status: ReturnRequestStatus = model.status.clone().into();

    Ok(ReturnRequest {
        id: ReturnRequestId::from_uuid(model.id),
        voucher_id: VoucherId::from_uuid(model.voucher_id),
        employee_id: EmployeeId::from_uuid(model.employee_id),
        amount: model.amount,
        currency,
        status,
        reason: model.reason.clone(),
        requested_at: model.requested_at.with_timezone(&Utc),
        decided_by: model.decided_by.map(EmployeeId::from_uuid),
        decided_at: model.decided_at.map(|t| t.with_timezone(&Utc)),
        decision_note: model.decision_note.clone(),
    })
}
