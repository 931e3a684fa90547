//! `SeaORM` entity definitions for the voucher ledger schema.

pub mod allocation_lines;
pub mod allocation_transactions;
pub mod ledger_entries;
pub mod return_requests;
pub mod sea_orm_active_enums;
pub mod voucher_usages;
pub mod vouchers;
