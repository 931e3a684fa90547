//! Exact reversal of voucher usage on report rejection.

pub mod service;

pub use service::{ReportReversal, ReversalOutcome, ReversalService};
