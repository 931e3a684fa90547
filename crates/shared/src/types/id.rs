//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `EmployeeId` where a
//! `VoucherId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(CompanyId, "Unique identifier for a company (tenant).");
typed_id!(EmployeeId, "Unique identifier for an employee.");
typed_id!(VoucherId, "Unique identifier for an advance-cash voucher.");
typed_id!(UsageId, "Unique identifier for a voucher usage row.");
typed_id!(ReportId, "Unique identifier for an expense report.");
typed_id!(ExpenseId, "Unique identifier for a single expense line.");
typed_id!(ProjectId, "Unique identifier for a project scope.");
typed_id!(CostCentreId, "Unique identifier for a cost-centre scope.");
typed_id!(AllocationId, "Unique identifier for an allocation transaction.");
typed_id!(ReturnRequestId, "Unique identifier for a balance return request.");
typed_id!(LedgerEntryId, "Unique identifier for a ledger journal entry.");
