//! Core business logic for the Advara voucher ledger engine.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and balance calculations live here; the
//! transactional persistence of their outcomes lives in `advara-db`.
//!
//! # Modules
//!
//! - `voucher` - Advance-cash voucher entity, status function, error taxonomy
//! - `allocation` - Tiered FIFO allocation planner
//! - `application` - Applying voucher balance to expense reports
//! - `reversal` - Restoring balances when a report is rejected
//! - `returns` - Returning unused balance (request/review + direct admin)
//! - `journal` - Append-only ledger journal entry construction
//! - `dashboard` - Read-only rollups over voucher snapshots
//! - `events` / `audit` - Injected side-channel interfaces

pub mod allocation;
pub mod application;
pub mod audit;
pub mod dashboard;
pub mod events;
pub mod journal;
pub mod returns;
pub mod reversal;
pub mod voucher;
