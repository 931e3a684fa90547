//! `SeaORM` Entity for the vouchers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::VoucherStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub code: Option<String>,
    pub currency: String,
    pub total: Decimal,
    pub used: Decimal,
    pub returned: Decimal,
    pub remaining: Decimal,
    pub project_id: Option<Uuid>,
    pub cost_centre_id: Option<Uuid>,
    pub expires_at: Option<DateTimeWithTimeZone>,
    pub status: VoucherStatus,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::voucher_usages::Entity")]
    VoucherUsages,
    #[sea_orm(has_many = "super::return_requests::Entity")]
    ReturnRequests,
}

impl Related<super::voucher_usages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VoucherUsages.def()
    }
}

impl Related<super::return_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReturnRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
