// src/types.rs

//! Small shared value types.

use std::fmt;

use serde::Deserialize;

/// Opaque operator identifier handed to us by the messaging front-end.
pub type OperatorId = i64;

/// Privilege level of a caller.
///
/// Variants are declared from least to most privileged, so the derived
/// `Ord` gives `Owner > Admin > User > Stranger`. A command is allowed when
/// `caller_role >= required`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Anyone not present in the operator registry.
    Stranger,
    User,
    Admin,
    Owner,
}

impl Role {
    /// Whether a caller holding `self` may run a command requiring `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Stranger => "stranger",
            Role::User => "user",
            Role::Admin => "admin",
            Role::Owner => "owner",
        };
        f.write_str(s)
    }
}
