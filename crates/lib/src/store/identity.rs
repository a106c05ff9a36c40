//! Reserved identities.

use std::fmt;

use crate::MeowId;
use crate::constants::{ADMIN_ID, GUEST_ID};

/// An identifier resolved against the reserved accounts.
///
/// Resolve once at the boundary with [`Identity::of`] and match on the
/// result instead of comparing identifiers against magic values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// The anonymous guest user (identifier 0).
    Guest,
    /// The administrator account.
    Admin,
    /// Any other account.
    Regular(MeowId),
}

impl Identity {
    pub fn of(id: MeowId) -> Self {
        match id {
            GUEST_ID => Identity::Guest,
            ADMIN_ID => Identity::Admin,
            other => Identity::Regular(other),
        }
    }

    /// The identifier this identity stands for.
    pub fn id(self) -> MeowId {
        match self {
            Identity::Guest => GUEST_ID,
            Identity::Admin => ADMIN_ID,
            Identity::Regular(id) => id,
        }
    }

    pub fn is_guest(self) -> bool {
        self == Identity::Guest
    }

    pub fn is_admin(self) -> bool {
        self == Identity::Admin
    }

    /// Whether the identity is one of the built-in accounts.
    pub fn is_reserved(self) -> bool {
        !matches!(self, Identity::Regular(_))
    }
}

impl From<MeowId> for Identity {
    fn from(id: MeowId) -> Self {
        Identity::of(id)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Guest => f.write_str("guest"),
            Identity::Admin => f.write_str("admin"),
            Identity::Regular(id) => write!(f, "{id}"),
        }
    }
}
