//! Append-only ledger journal.
//!
//! One journal row per balance-changing event, carrying enough descriptive
//! metadata to reconstruct an audit trail independent of the live voucher
//! tables. The journal is a downstream record, never a source of truth for
//! balances, and never consulted by the mutation logic.
//!
//! - `entry` - Entry kinds, debit/credit account tags, entry construction
//! - `fiscal` - Financial-year bucketing for ledger partitioning

pub mod entry;
pub mod fiscal;

pub use entry::{JournalEntryInput, LedgerEntryKind};
pub use fiscal::financial_year;
