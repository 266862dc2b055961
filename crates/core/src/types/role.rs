//! Roles and request privilege levels.

use serde::{Deserialize, Serialize};

/// Role string the server uses to mark administrators.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Effective role of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May manage the catalog.
    Admin,
    /// Regular shopper.
    User,
}

impl Role {
    /// Derive the effective role from the server's role collection.
    ///
    /// Any collection containing `"ADMIN"` yields [`Role::Admin`]; everything
    /// else, including an empty collection, is [`Role::User`].
    pub fn from_roles<'a, I>(roles: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        if roles.into_iter().any(|r| r == ADMIN_ROLE) {
            Self::Admin
        } else {
            Self::User
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::User => write!(f, "USER"),
        }
    }
}

/// Privilege a request needs; selects which default credential is tried first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    User,
    Admin,
}

impl std::fmt::Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}
