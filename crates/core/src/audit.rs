//! Audit trail side channel.
//!
//! Every state-changing operation produces one audit record naming the
//! actor, the action, and the affected entity. Like events, audit delivery
//! is best-effort after commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use advara_shared::types::{CompanyId, EmployeeId};

/// One audit trail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Owning company.
    pub company_id: CompanyId,
    /// Who performed the action.
    pub actor_id: EmployeeId,
    /// Action name, e.g. "voucher.apply" or "return.approve".
    pub action: &'static str,
    /// Kind of the primary entity affected, e.g. "voucher".
    pub entity_type: &'static str,
    /// Primary entity affected.
    pub entity_id: Uuid,
    /// Structured action details (amounts, counterparties).
    pub details: Value,
    /// When the action happened.
    pub occurred_at: DateTime<Utc>,
}

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    /// Records one audit entry.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the delivery failure.
    fn record(&self, record: &AuditRecord) -> Result<(), String>;
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAudit;

impl AuditSink for NoopAudit {
    fn record(&self, _record: &AuditRecord) -> Result<(), String> {
        Ok(())
    }
}

/// Sink that keeps records in memory, for test assertions.
#[derive(Debug, Default)]
pub struct RecordingAudit {
    records: std::sync::Mutex<Vec<AuditRecord>>,
}

impl RecordingAudit {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, record: &AuditRecord) -> Result<(), String> {
        self.records
            .lock()
            .map_err(|_| "audit recorder poisoned".to_string())?
            .push(record.clone());
        Ok(())
    }
}
