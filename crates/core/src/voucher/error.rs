//! Engine-wide error taxonomy for voucher operations.
//!
//! Every precondition failure is a distinct variant with a stable error
//! code, so callers (report lifecycle driver, admin UI) can react
//! differently to "insufficient funds" versus "already applied" versus
//! "not yours". All of these are raised before any mutation begins.

use rust_decimal::Decimal;
use thiserror::Error;

use advara_shared::AppError;
use advara_shared::types::{EmployeeId, ReportId, ReturnRequestId, VoucherId};
use advara_shared::types::money::Currency;

/// Errors that can occur during voucher engine operations.
#[derive(Debug, Error)]
pub enum VoucherError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive.
    #[error("Amount must be positive, got {amount}")]
    InvalidAmount {
        /// The offending amount.
        amount: Decimal,
    },

    /// Currency of the request does not match the voucher's currency.
    #[error("Currency mismatch: voucher is {expected}, request is {actual}")]
    CurrencyMismatch {
        /// The voucher's currency.
        expected: Currency,
        /// The requested currency.
        actual: Currency,
    },

    // ========== Not Found Errors ==========
    /// Voucher does not exist.
    #[error("Voucher not found: {0}")]
    VoucherNotFound(VoucherId),

    /// Expense report does not exist.
    #[error("Report not found: {0}")]
    ReportNotFound(ReportId),

    /// Return request does not exist.
    #[error("Return request not found: {0}")]
    RequestNotFound(ReturnRequestId),

    // ========== Ownership Errors ==========
    /// Voucher belongs to a different employee.
    #[error("Voucher {voucher_id} does not belong to employee {employee_id}")]
    VoucherOwnership {
        /// The voucher.
        voucher_id: VoucherId,
        /// The acting employee.
        employee_id: EmployeeId,
    },

    /// Report belongs to a different employee.
    #[error("Report {report_id} does not belong to employee {employee_id}")]
    ReportOwnership {
        /// The report.
        report_id: ReportId,
        /// The acting employee.
        employee_id: EmployeeId,
    },

    // ========== State Conflict Errors ==========
    /// Report has left its pre-finalization editable state.
    #[error("Report {0} is not editable")]
    ReportNotEditable(ReportId),

    /// Voucher balance is fully consumed.
    #[error("Voucher {0} is exhausted")]
    VoucherExhausted(VoucherId),

    /// Voucher balance was fully returned (terminal).
    #[error("Voucher {0} has been returned")]
    VoucherReturned(VoucherId),

    /// Voucher has passed its expiry timestamp.
    #[error("Voucher {0} has expired")]
    VoucherExpired(VoucherId),

    /// A non-reversed usage already exists for this (voucher, report) pair.
    #[error("Voucher {voucher_id} is already applied to report {report_id}")]
    AlreadyApplied {
        /// The voucher.
        voucher_id: VoucherId,
        /// The report.
        report_id: ReportId,
    },

    /// Return request is not in the PENDING state.
    #[error("Return request {0} is not pending")]
    RequestNotPending(ReturnRequestId),

    /// A PENDING return request already exists for this voucher.
    #[error("A pending return request already exists for voucher {0}")]
    PendingRequestExists(VoucherId),

    /// Optimistic concurrency check failed: a concurrent writer committed
    /// first. Callers may retry with a fresh read.
    #[error("Voucher {voucher_id} version mismatch: expected {expected}, found {actual}")]
    VersionMismatch {
        /// The voucher.
        voucher_id: VoucherId,
        /// Version the mutation was computed against.
        expected: i64,
        /// Version found at commit time.
        actual: i64,
    },

    // ========== Balance Errors ==========
    /// Requested amount exceeds the voucher's remaining balance.
    #[error("Insufficient balance: requested {requested}, remaining {remaining}")]
    InsufficientBalance {
        /// The requested amount.
        requested: Decimal,
        /// The remaining balance at validation time.
        remaining: Decimal,
    },
}

impl VoucherError {
    /// Returns the stable error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::VoucherNotFound(_) => "VOUCHER_NOT_FOUND",
            Self::ReportNotFound(_) => "REPORT_NOT_FOUND",
            Self::RequestNotFound(_) => "RETURN_REQUEST_NOT_FOUND",
            Self::VoucherOwnership { .. } => "VOUCHER_OWNERSHIP",
            Self::ReportOwnership { .. } => "REPORT_OWNERSHIP",
            Self::ReportNotEditable(_) => "REPORT_NOT_EDITABLE",
            Self::VoucherExhausted(_) => "VOUCHER_EXHAUSTED",
            Self::VoucherReturned(_) => "VOUCHER_RETURNED",
            Self::VoucherExpired(_) => "VOUCHER_EXPIRED",
            Self::AlreadyApplied { .. } => "ALREADY_APPLIED",
            Self::RequestNotPending(_) => "REQUEST_NOT_PENDING",
            Self::PendingRequestExists(_) => "PENDING_REQUEST_EXISTS",
            Self::VersionMismatch { .. } => "VERSION_MISMATCH",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } | Self::CurrencyMismatch { .. } => 400,

            Self::VoucherOwnership { .. } | Self::ReportOwnership { .. } => 403,

            Self::VoucherNotFound(_) | Self::ReportNotFound(_) | Self::RequestNotFound(_) => 404,

            Self::ReportNotEditable(_)
            | Self::VoucherExhausted(_)
            | Self::VoucherReturned(_)
            | Self::VoucherExpired(_)
            | Self::AlreadyApplied { .. }
            | Self::RequestNotPending(_)
            | Self::PendingRequestExists(_)
            | Self::VersionMismatch { .. } => 409,

            Self::InsufficientBalance { .. } => 422,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only concurrency conflicts are: the mutation may succeed against a
    /// fresh read. Everything else is deterministic.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionMismatch { .. })
    }
}

impl From<VoucherError> for AppError {
    fn from(err: VoucherError) -> Self {
        let message = err.to_string();
        match err {
            VoucherError::InvalidAmount { .. } | VoucherError::CurrencyMismatch { .. } => {
                Self::Validation(message)
            }
            VoucherError::VoucherNotFound(_)
            | VoucherError::ReportNotFound(_)
            | VoucherError::RequestNotFound(_) => Self::NotFound(message),
            VoucherError::VoucherOwnership { .. } | VoucherError::ReportOwnership { .. } => {
                Self::Ownership(message)
            }
            VoucherError::InsufficientBalance { .. } => Self::InsufficientBalance(message),
            _ => Self::StateConflict(message),
        }
    }
}
