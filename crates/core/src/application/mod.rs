//! Applying voucher balance to expense reports.
//!
//! The pure half of the Application Service: precondition checks and
//! outcome computation. The transactional half (atomic persistence with
//! the optimistic version check) lives in `advara-db`.
//!
//! - `types` - Report snapshot, voucher usage, allocation transaction
//! - `service` - Validation and apply/apply-allocation outcome computation

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::ApplicationService;
pub use types::{
    AllocationApplyOutcome, AllocationTransaction, ApplyOutcome, ReportSnapshot, ShortfallPolicy,
    UsageStatus, VoucherUsage,
};
