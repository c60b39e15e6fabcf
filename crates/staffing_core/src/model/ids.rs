//! Storage-assigned identifiers for each entity kind.
//!
//! Ids are distinct newtypes so an employee id can never be used where a
//! project id is expected.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Entity kind tag used in errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Employee,
    Employer,
    Project,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Employer => "employer",
            Self::Project => "project",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw storage id.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw storage id.
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Entity kind this id addresses.
            pub const fn kind() -> EntityKind {
                $kind
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Stable id of one employee row.
    EmployeeId,
    EntityKind::Employee
);
entity_id!(
    /// Stable id of one employer row.
    EmployerId,
    EntityKind::Employer
);
entity_id!(
    /// Stable id of one project row.
    ProjectId,
    EntityKind::Project
);
