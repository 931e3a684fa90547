//! Advance-cash voucher domain model.
//!
//! This module defines the voucher entity, its lifecycle status function,
//! and the error taxonomy shared by every balance-mutating operation:
//! - `types` - Voucher snapshot, scope, status, balance mutation primitives
//! - `error` - Engine-wide error taxonomy with stable error codes

pub mod error;
pub mod types;

#[cfg(test)]
mod status_props;

pub use error::VoucherError;
pub use types::{Voucher, VoucherScope, VoucherStatus, derive_status};
