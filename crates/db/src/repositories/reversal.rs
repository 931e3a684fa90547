//! Reversal repository.
//!
//! Runs the report-rejection path: loads every usage that funded the
//! rejected report together with its voucher, lets the pure
//! `ReversalService` compute the exact restorations, and commits them in
//! one transaction. Re-processing a rejection is a no-op for usages that
//! are already reversed.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use advara_core::application::{UsageStatus, VoucherUsage};
use advara_core::audit::{AuditRecord, AuditSink, NoopAudit};
use advara_core::events::{EngineEvent, EventPublisher, NoopPublisher};
use advara_core::reversal::{ReportReversal, ReversalService};
use advara_core::voucher::Voucher;
use advara_shared::types::money::Currency;
use advara_shared::types::{EmployeeId, ReportId, UsageId, VoucherId};

use crate::entities::{voucher_usages, vouchers};

use super::RepoError;
use super::ledger::LedgerRepository;
use super::voucher::{self, VoucherRepository};

/// Reversal repository.
pub struct ReversalRepository {
    db: DatabaseConnection,
    events: Arc<dyn EventPublisher>,
    audit: Arc<dyn AuditSink>,
}

impl ReversalRepository {
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

    /// Reverses every live usage that funded `report_id`.
    ///
    /// # Errors
    ///
    /// Returns `VersionMismatch` on a lost concurrent race (retryable),
    /// or a database error. On any error nothing is committed.
    pub async fn reverse_report(
        &self,
        report_id: ReportId,
        actor: EmployeeId,
        reason: Option<String>,
    ) -> Result<ReportReversal, RepoError> {
        let now = Utc::now();
        let pairs = self.load_report_usages(report_id).await?;

        let reversal =
            ReversalService::reverse_report(report_id, &pairs, actor, reason, now)?;
        if reversal.outcomes.is_empty() {
            return Ok(reversal);
        }

        let txn = self.db.begin().await?;
        for outcome in &reversal.outcomes {
            let expected_version = pairs
                .iter()
                .find(|(v, _)| v.id == outcome.voucher.id)
                .map_or(outcome.voucher.version, |(v, _)| v.version);
            VoucherRepository::update_with_version(&txn, &outcome.voucher, expected_version)
                .await?;
            Self::mark_usage_reversed(&txn, &outcome.usage).await?;
        }
        txn.commit().await?;

        self.post_commit(&reversal).await;
        Ok(reversal)
    }

    /// Loads each usage of the report paired with the current state of its
    /// voucher.
    async fn load_report_usages(
        &self,
        report_id: ReportId,
    ) -> Result<Vec<(Voucher, VoucherUsage)>, RepoError> {
        let usage_rows = voucher_usages::Entity::find()
            .filter(voucher_usages::Column::ReportId.eq(report_id.into_inner()))
            .all(&self.db)
            .await?;
        if usage_rows.is_empty() {
            return Ok(Vec::new());
        }

        let voucher_ids: Vec<_> = usage_rows.iter().map(|u| u.voucher_id).collect();
        let voucher_rows = vouchers::Entity::find()
            .filter(vouchers::Column::Id.is_in(voucher_ids))
            .all(&self.db)
            .await?;
        let by_id: HashMap<_, _> = voucher_rows.iter().map(|v| (v.id, v)).collect();

        let mut pairs = Vec::with_capacity(usage_rows.len());
        for row in &usage_rows {
            let model = by_id.get(&row.voucher_id).ok_or_else(|| {
                RepoError::Corrupt(format!("usage {} references missing voucher", row.id))
            })?;
            pairs.push((voucher::to_domain(model)?, usage_to_domain(row)?));
        }
        Ok(pairs)
    }

    /// Flips the usage row to REVERSED.
    async fn mark_usage_reversed(
        txn: &DatabaseTransaction,
        usage: &VoucherUsage,
    ) -> Result<(), RepoError> {
        let update = voucher_usages::ActiveModel {
            status: Set(usage.status.into()),
            reversed_by: Set(usage.reversed_by.map(EmployeeId::into_inner)),
            reversed_at: Set(usage.reversed_at.map(Into::into)),
            reversal_reason: Set(usage.reversal_reason.clone()),
            ..Default::default()
        };
        voucher_usages::Entity::update_many()
            .set(update)
            .filter(voucher_usages::Column::Id.eq(usage.id.into_inner()))
            .exec(txn)
            .await?;
        Ok(())
    }

    /// Best-effort journal, event, and audit delivery after commit.
    async fn post_commit(&self, reversal: &ReportReversal) {
        let ledger = LedgerRepository::new(self.db.clone());
        for outcome in &reversal.outcomes {
            if let Err(err) = ledger.append(&outcome.journal).await {
                tracing::warn!(
                    voucher_id = %outcome.voucher.id,
                    error = %err,
                    "reversal journal append failed"
                );
            }
            let event = EngineEvent::ApplicationReversed {
                voucher_id: outcome.voucher.id,
                report_id: outcome.usage.report_id,
                amount: outcome.usage.amount,
                currency: outcome.usage.currency,
            };
            if let Err(err) = self.events.publish(&event) {
                tracing::warn!(voucher_id = %outcome.voucher.id, error = %err, "event publish failed");
            }
            let record = AuditRecord {
                company_id: outcome.voucher.company_id,
                actor_id: outcome.usage.reversed_by.unwrap_or(outcome.usage.applied_by),
                action: "voucher.reverse",
                entity_type: "voucher",
                entity_id: outcome.voucher.id.into_inner(),
                details: serde_json::json!({
                    "report_id": outcome.usage.report_id,
                    "amount": outcome.usage.amount,
                    "currency": outcome.usage.currency,
                    "reason": outcome.usage.reversal_reason,
                }),
                occurred_at: outcome.usage.reversed_at.unwrap_or_else(Utc::now),
            };
            if let Err(err) = self.audit.record(&record) {
                tracing::warn!(voucher_id = %outcome.voucher.id, error = %err, "audit record failed");
            }
        }
    }
}

/// Maps a stored usage row back to the domain type.
pub(crate) fn usage_to_domain(model: &voucher_usages::Model) -> Result<VoucherUsage, RepoError> {
    let currency = Currency::from_str(&model.currency).map_err(RepoError::Corrupt)?;
    let status: UsageStatus = model.status.clone().into();

    Ok(VoucherUsage {
        id: UsageId::from_uuid(model.id),
        voucher_id: VoucherId::from_uuid(model.voucher_id),
        report_id: ReportId::from_uuid(model.report_id),
        employee_id: EmployeeId::from_uuid(model.employee_id),
        amount: model.amount,
        currency,
        status,
        applied_by: EmployeeId::from_uuid(model.applied_by),
        applied_at: model.applied_at.with_timezone(&Utc),
        reversed_by: model.reversed_by.map(EmployeeId::from_uuid),
        reversed_at: model.reversed_at.map(|t| t.with_timezone(&Utc)),
        reversal_reason: model.reversal_reason.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::entities::sea_orm_active_enums;

    #[test]
    fn test_usage_to_domain_maps_reversal_fields() {
        let reverser = Uuid::now_v7();
        let row = voucher_usages::Model {
            id: Uuid::now_v7(),
            voucher_id: Uuid::now_v7(),
            report_id: Uuid::now_v7(),
            employee_id: Uuid::now_v7(),
            amount: dec!(80),
            currency: "INR".to_string(),
            status: sea_orm_active_enums::UsageStatus::Reversed,
            applied_by: Uuid::now_v7(),
            applied_at: Utc::now().into(),
            reversed_by: Some(reverser),
            reversed_at: Some(Utc::now().into()),
            reversal_reason: Some("report rejected".to_string()),
            created_at: Utc::now().into(),
        };

        let usage = usage_to_domain(&row).unwrap();
        assert_eq!(usage.amount, dec!(80));
        assert_eq!(usage.status, UsageStatus::Reversed);
        assert!(!usage.is_applied());
        assert_eq!(usage.reversed_by.map(EmployeeId::into_inner), Some(reverser));
        assert_eq!(usage.reversal_reason.as_deref(), Some("report rejected"));
    }
}
