//! Role-based access decisions for navigation and admin actions.

use eshop_core::Role;

use crate::routes::Route;
use crate::session::SessionSnapshot;

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    RedirectTo(Route),
}

impl Access {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

pub struct RoleGuard;

impl RoleGuard {
    /// Admin-only screens and actions.
    ///
    /// Logged out goes to sign-in; logged in without the admin role goes to
    /// the catalog.
    #[must_use]
    pub fn admin(session: &SessionSnapshot) -> Access {
        if !session.is_logged_in {
            return Access::RedirectTo(Route::Login);
        }
        match session.role {
            Some(Role::Admin) => Access::Allow,
            _ => Access::RedirectTo(Route::Products),
        }
    }

    /// Screens that need any signed-in user.
    #[must_use]
    pub fn authenticated(session: &SessionSnapshot) -> Access {
        if session.is_logged_in {
            Access::Allow
        } else {
            Access::RedirectTo(Route::Login)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(is_logged_in: bool, role: Option<Role>) -> SessionSnapshot {
        SessionSnapshot {
            is_logged_in,
            role,
            user: None,
            generation: 0,
        }
    }

    #[test]
    fn test_admin_guard_decisions() {
        assert_eq!(
            RoleGuard::admin(&session(false, None)),
            Access::RedirectTo(Route::Login)
        );
        assert_eq!(
            RoleGuard::admin(&session(false, Some(Role::Admin))),
            Access::RedirectTo(Route::Login)
        );
        assert_eq!(
            RoleGuard::admin(&session(true, Some(Role::User))),
            Access::RedirectTo(Route::Products)
        );
        assert!(RoleGuard::admin(&session(true, Some(Role::Admin))).is_allowed());
    }

    #[test]
    fn test_token_without_profile_is_not_admin() {
        assert_eq!(
            RoleGuard::admin(&session(true, None)),
            Access::RedirectTo(Route::Products)
        );
        assert!(RoleGuard::authenticated(&session(true, None)).is_allowed());
    }

    #[test]
    fn test_authenticated_guard() {
        assert_eq!(
            RoleGuard::authenticated(&session(false, None)),
            Access::RedirectTo(Route::Login)
        );
        assert!(RoleGuard::authenticated(&session(true, Some(Role::User))).is_allowed());
    }
}
