//! Postgres enum mappings for the status columns.
//!
//! Each database enum has a conversion pair to its `advara-core` counterpart
//! so repositories translate at the boundary and the core never sees
//! `SeaORM` types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use advara_core::application::UsageStatus as CoreUsageStatus;
use advara_core::allocation::Tier as CoreTier;
use advara_core::journal::LedgerEntryKind as CoreLedgerEntryKind;
use advara_core::returns::ReturnRequestStatus as CoreReturnRequestStatus;
use advara_core::voucher::VoucherStatus as CoreVoucherStatus;

/// `voucher_status` database enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "voucher_status")]
pub enum VoucherStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "exhausted")]
    Exhausted,
    #[sea_orm(string_value = "returned")]
    Returned,
}

impl From<CoreVoucherStatus> for VoucherStatus {
    fn from(status: CoreVoucherStatus) -> Self {
        match status {
            CoreVoucherStatus::Active => Self::Active,
            CoreVoucherStatus::Partial => Self::Partial,
            CoreVoucherStatus::Exhausted => Self::Exhausted,
            CoreVoucherStatus::Returned => Self::Returned,
        }
    }
}

impl From<VoucherStatus> for CoreVoucherStatus {
    fn from(status: VoucherStatus) -> Self {
        match status {
            VoucherStatus::Active => Self::Active,
            VoucherStatus::Partial => Self::Partial,
            VoucherStatus::Exhausted => Self::Exhausted,
            VoucherStatus::Returned => Self::Returned,
        }
    }
}

/// `usage_status` database enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "usage_status")]
pub enum UsageStatus {
    #[sea_orm(string_value = "applied")]
    Applied,
    #[sea_orm(string_value = "reversed")]
    Reversed,
}

impl From<CoreUsageStatus> for UsageStatus {
    fn from(status: CoreUsageStatus) -> Self {
        match status {
            CoreUsageStatus::Applied => Self::Applied,
            CoreUsageStatus::Reversed => Self::Reversed,
        }
    }
}

impl From<UsageStatus> for CoreUsageStatus {
    fn from(status: UsageStatus) -> Self {
        match status {
            UsageStatus::Applied => Self::Applied,
            UsageStatus::Reversed => Self::Reversed,
        }
    }
}

/// `return_request_status` database enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "return_request_status")]
pub enum ReturnRequestStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<CoreReturnRequestStatus> for ReturnRequestStatus {
    fn from(status: CoreReturnRequestStatus) -> Self {
        match status {
            CoreReturnRequestStatus::Pending => Self::Pending,
            CoreReturnRequestStatus::Approved => Self::Approved,
            CoreReturnRequestStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<ReturnRequestStatus> for CoreReturnRequestStatus {
    fn from(status: ReturnRequestStatus) -> Self {
        match status {
            ReturnRequestStatus::Pending => Self::Pending,
            ReturnRequestStatus::Approved => Self::Approved,
            ReturnRequestStatus::Rejected => Self::Rejected,
        }
    }
}

/// `ledger_entry_kind` database enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_entry_kind")]
pub enum LedgerEntryKind {
    #[sea_orm(string_value = "issued")]
    Issued,
    #[sea_orm(string_value = "used")]
    Used,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "reversed")]
    Reversed,
}

impl From<CoreLedgerEntryKind> for LedgerEntryKind {
    fn from(kind: CoreLedgerEntryKind) -> Self {
        match kind {
            CoreLedgerEntryKind::Issued => Self::Issued,
            CoreLedgerEntryKind::Used => Self::Used,
            CoreLedgerEntryKind::Returned => Self::Returned,
            CoreLedgerEntryKind::Reversed => Self::Reversed,
        }
    }
}

impl From<LedgerEntryKind> for CoreLedgerEntryKind {
    fn from(kind: LedgerEntryKind) -> Self {
        match kind {
            LedgerEntryKind::Issued => Self::Issued,
            LedgerEntryKind::Used => Self::Used,
            LedgerEntryKind::Returned => Self::Returned,
            LedgerEntryKind::Reversed => Self::Reversed,
        }
    }
}

/// `allocation_tier` database enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "allocation_tier")]
pub enum AllocationTier {
    #[sea_orm(string_value = "project_scoped")]
    ProjectScoped,
    #[sea_orm(string_value = "cost_centre_scoped")]
    CostCentreScoped,
    #[sea_orm(string_value = "unscoped")]
    Unscoped,
}

impl From<CoreTier> for AllocationTier {
    fn from(tier: CoreTier) -> Self {
        match tier {
            CoreTier::ProjectScoped => Self::ProjectScoped,
            CoreTier::CostCentreScoped => Self::CostCentreScoped,
            CoreTier::Unscoped => Self::Unscoped,
        }
    }
}

impl From<AllocationTier> for CoreTier {
    fn from(tier: AllocationTier) -> Self {
        match tier {
            AllocationTier::ProjectScoped => Self::ProjectScoped,
            AllocationTier::CostCentreScoped => Self::CostCentreScoped,
            AllocationTier::Unscoped => Self::Unscoped,
        }
    }
}
