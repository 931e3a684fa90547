//! `SeaORM` Entity for the ledger_entries table.
//!
//! Append-only: repositories expose insert and queries, never updates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::LedgerEntryKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub kind: LedgerEntryKind,
    pub voucher_id: Option<Uuid>,
    pub report_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub debit_account: String,
    pub credit_account: String,
    pub description: String,
    pub reference: Option<String>,
    pub entry_date: Date,
    pub financial_year: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
