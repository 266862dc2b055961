//! Navigation surface and route resolution.

use std::fmt;

use eshop_core::ProductId;

use crate::guard::{Access, RoleGuard};
use crate::session::SessionSnapshot;

/// Every screen the storefront can show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Products,
    ProductDetail(ProductId),
    Login,
    Signup,
    AddProduct,
    ModifyProduct(ProductId),
    CreateOrder,
    NotFound,
}

impl Route {
    /// Match a path against the routing table; anything unknown is `NotFound`.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["products"] => Self::Products,
            ["products", "modify", id] => Self::ModifyProduct(ProductId::new(*id)),
            ["products", id] => Self::ProductDetail(ProductId::new(*id)),
            ["login"] => Self::Login,
            ["signup"] => Self::Signup,
            ["add-product"] => Self::AddProduct,
            ["create-order"] => Self::CreateOrder,
            _ => Self::NotFound,
        }
    }

    /// Routes only admins may open.
    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        matches!(self, Self::AddProduct | Self::ModifyProduct(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Products => f.write_str("/products"),
            Self::ProductDetail(id) => write!(f, "/products/{id}"),
            Self::Login => f.write_str("/login"),
            Self::Signup => f.write_str("/signup"),
            Self::AddProduct => f.write_str("/add-product"),
            Self::ModifyProduct(id) => write!(f, "/products/modify/{id}"),
            Self::CreateOrder => f.write_str("/create-order"),
            Self::NotFound => f.write_str("/404"),
        }
    }
}

/// Applies session-dependent redirects to a requested route.
pub struct Router;

impl Router {
    /// The route that actually renders when `requested` is opened.
    #[must_use]
    pub fn resolve(requested: Route, session: &SessionSnapshot) -> Route {
        match requested {
            Route::Home if session.is_logged_in => Route::Products,
            Route::Home => Route::Login,
            Route::Login | Route::Signup if session.is_logged_in => Route::Products,
            Route::CreateOrder | Route::Products => match RoleGuard::authenticated(session) {
                Access::Allow => requested,
                Access::RedirectTo(to) => to,
            },
            route if route.requires_admin() => match RoleGuard::admin(session) {
                Access::Allow => route,
                Access::RedirectTo(to) => to,
            },
            route => route,
        }
    }
}

#[cfg(test)]
mod tests {
    use eshop_core::Role;

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
    fn test_parse_table() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/products"), Route::Products);
        assert_eq!(Route::parse("/products/"), Route::Products);
        assert_eq!(
            Route::parse("/products/p1"),
            Route::ProductDetail(ProductId::new("p1"))
        );
        assert_eq!(
            Route::parse("/products/modify/p1"),
            Route::ModifyProduct(ProductId::new("p1"))
        );
        assert_eq!(Route::parse("/login?next=/products"), Route::Login);
        assert_eq!(Route::parse("/add-product"), Route::AddProduct);
        assert_eq!(Route::parse("/create-order"), Route::CreateOrder);
        assert_eq!(Route::parse("/products/p1/reviews"), Route::NotFound);
        assert_eq!(Route::parse("/checkout"), Route::NotFound);
    }

    #[test]
    fn test_display_matches_parse() {
        for path in ["/", "/products", "/products/p1", "/products/modify/7", "/signup"] {
            assert_eq!(Route::parse(path).to_string(), path);
        }
    }

    #[test]
    fn test_home_redirects_by_login_state() {
        assert_eq!(
            Router::resolve(Route::Home, &session(false, None)),
            Route::Login
        );
        assert_eq!(
            Router::resolve(Route::Home, &session(true, Some(Role::User))),
            Route::Products
        );
    }

    #[test]
    fn test_auth_pages_redirect_when_logged_in() {
        let user = session(true, Some(Role::User));
        assert_eq!(Router::resolve(Route::Login, &user), Route::Products);
        assert_eq!(Router::resolve(Route::Signup, &user), Route::Products);
        assert_eq!(
            Router::resolve(Route::Signup, &session(false, None)),
            Route::Signup
        );
    }

    #[test]
    fn test_admin_routes_are_guarded() {
        let route = Route::ModifyProduct(ProductId::new("p1"));
        assert_eq!(
            Router::resolve(route.clone(), &session(false, None)),
            Route::Login
        );
        assert_eq!(
            Router::resolve(route.clone(), &session(true, Some(Role::User))),
            Route::Products
        );
        assert_eq!(
            Router::resolve(route.clone(), &session(true, Some(Role::Admin))),
            route
        );
    }

    #[test]
    fn test_create_order_requires_login() {
        assert_eq!(
            Router::resolve(Route::CreateOrder, &session(false, None)),
            Route::Login
        );
        assert_eq!(
            Router::resolve(Route::CreateOrder, &session(true, Some(Role::User))),
            Route::CreateOrder
        );
    }
}
