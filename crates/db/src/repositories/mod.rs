//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Each pairs a pure `advara-core` service with transactional
//! persistence: the core computes the outcome, the repository commits it.

pub mod application;
pub mod dashboard;
pub mod ledger;
pub mod returns;
pub mod reversal;
pub mod voucher;

pub use application::{ApplicationRepository, ApplyToReportInput};
pub use dashboard::DashboardRepository;
pub use ledger::{LedgerEntry, LedgerFilter, LedgerRepository};
pub use returns::ReturnRepository;
pub use reversal::ReversalRepository;
pub use voucher::{IssueVoucherInput, VoucherRepository};

use sea_orm::DbErr;

use advara_core::voucher::VoucherError;
use advara_shared::error::AppError;

/// Error type shared by all repositories.
///
/// Domain failures keep their full [`VoucherError`] taxonomy (including the
/// stable error codes and retryability); everything else is a storage
/// problem.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] VoucherError),

    /// A stored value could not be mapped back to its domain type.
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepoError {
    /// Returns true if retrying the whole operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Domain(err) => err.is_retryable(),
            Self::Corrupt(_) | Self::Database(_) => false,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(domain) => domain.into(),
            RepoError::Corrupt(msg) => Self::Internal(msg),
            RepoError::Database(db) => Self::Database(db.to_string()),
        }
    }
}
