//! Engine event side channel.
//!
//! Balance mutations publish notifications (voucher issued, applied,
//! reversed, returned) to whatever bus the deployment wires in. Publication
//! is best-effort after commit: a failed publish is logged by the caller and
//! never rolls back ledger state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use advara_shared::types::{EmployeeId, ReportId, ReturnRequestId, VoucherId};
use advara_shared::types::money::Currency;

/// A domain event emitted after a committed balance mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A new voucher was issued.
    VoucherIssued {
        /// The freshly issued voucher.
        voucher_id: VoucherId,
        /// The employee the voucher belongs to.
        employee_id: EmployeeId,
        /// The issued total.
        amount: Decimal,
        /// Currency of the voucher.
        currency: Currency,
    },
    /// Voucher balance was applied to a report.
    VoucherApplied {
        /// The drawn voucher.
        voucher_id: VoucherId,
        /// The funded report.
        report_id: ReportId,
        /// Amount drawn from this voucher.
        amount: Decimal,
        /// Currency of the draw.
        currency: Currency,
    },
    /// A previous application was reversed.
    ApplicationReversed {
        /// The voucher whose balance was restored.
        voucher_id: VoucherId,
        /// The rejected report the draw had funded.
        report_id: ReportId,
        /// Amount restored onto the voucher.
        amount: Decimal,
        /// Currency of the restored amount.
        currency: Currency,
    },
    /// Unused balance was returned.
    BalanceReturned {
        /// The voucher the balance came off.
        voucher_id: VoucherId,
        /// The approved return request, or `None` for a direct admin return.
        request_id: Option<ReturnRequestId>,
        /// Amount returned.
        amount: Decimal,
        /// Currency of the return.
        currency: Currency,
    },
}

/// Destination for engine events.
///
/// Implementations must not block for long and must swallow their own
/// transport failures into the returned error; the engine logs and moves on.
pub trait EventPublisher: Send + Sync {
    /// Publishes one event.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the transport failure.
    fn publish(&self, event: &EngineEvent) -> Result<(), String>;
}

/// Publisher that drops everything. The default wiring for deployments
/// without a bus, and for tests that don't care about events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: &EngineEvent) -> Result<(), String> {
        Ok(())
    }
}

/// Publisher that records events in memory, for test assertions.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: std::sync::Mutex<Vec<EngineEvent>>,
}

impl RecordingPublisher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything published so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<EngineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: &EngineEvent) -> Result<(), String> {
        self.events
            .lock()
            .map_err(|_| "event recorder poisoned".to_string())?
            .push(event.clone());
        Ok(())
    }
}
