//! Typed identifiers for repository functions.
//!
//! All tables use `i64` primary keys; wrapping them keeps a unit id from being
//! passed where a lease id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Primary key of a building
    BuildingId
);
id_type!(
    /// Primary key of a unit
    UnitId
);
id_type!(
    /// Primary key of a tenant
    TenantId
);
id_type!(
    /// Primary key of a lease
    LeaseId
);
id_type!(
    /// Primary key of a billing period
    PeriodId
);
id_type!(
    /// Primary key of a maintenance ticket
    TicketId
);
id_type!(
    /// Primary key of a contractor
    ContractorId
);
id_type!(
    /// Primary key of a key
    KeyId
);
id_type!(
    /// Primary key of a key hand-over
    KeyIssueId
);
