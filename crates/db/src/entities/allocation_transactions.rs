//! `SeaORM` Entity for the allocation_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allocation_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub report_id: Uuid,
    pub expense_id: Option<Uuid>,
    pub total: Decimal,
    pub currency: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::allocation_lines::Entity")]
    AllocationLines,
}

impl Related<super::allocation_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AllocationLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
