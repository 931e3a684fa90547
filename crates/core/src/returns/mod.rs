//! The balance return workflow (request/review and direct admin return).

pub mod service;
pub mod types;

pub use service::{ReturnOutcome, ReturnService};
pub use types::{ReturnRequest, ReturnRequestStatus};
