//! Tiered FIFO allocation of voucher balances.
//!
//! The allocation algorithm exists exactly once, here, as a pure planner.
//! Every mutation path (application service, per-expense deduction, return
//! workflow) consumes its plan rather than re-deriving its own ordering.
//!
//! - `types` - Allocation request, plan, and tier definitions
//! - `engine` - The planner itself

pub mod engine;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::AllocationEngine;
pub use types::{AllocationLine, AllocationPlan, AllocationRequest, Tier};
