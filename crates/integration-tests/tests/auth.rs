//! Integration tests for sign-in, sign-up, logout and route resolution.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use secrecy::ExposeSecret;

use eshop_core::{ProductId, Role};
use eshop_integration_tests::{MockApi, product, sign_in};
use eshop_storefront::forms::{LoginForm, SignupForm};
use eshop_storefront::routes::{Route, Router};
use eshop_storefront::services::auth::{AuthError, AuthService, SIGNUP_SUCCESS};
use eshop_storefront::views::REDIRECT_DELAY;
use eshop_storefront::views::catalog::CatalogView;

const USER: &str = "user@example.com";
const ADMIN: &str = "admin@example.com";
const PASSWORD: &str = "pw-1";

async fn api() -> MockApi {
    MockApi::builder()
        .product(product("p1", "Shoe", "Apparel", 5, "100"))
        .account(USER, PASSWORD, "user-token", &["USER"])
        .account(ADMIN, PASSWORD, "admin-token", &["USER", "ADMIN"])
        .start()
        .await
        .unwrap()
}

fn login(username: &str, password: &str) -> LoginForm {
    LoginForm {
        username: username.to_string(),
        password: password.to_string(),
    }
}

fn signup(email: &str) -> SignupForm {
    SignupForm {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        password: "pw-2".to_string(),
        confirm_password: "pw-2".to_string(),
        contact_number: "9999999999".to_string(),
    }
}

// =============================================================================
// Sign-in
// =============================================================================

#[tokio::test]
async fn test_sign_in_starts_session() {
    let api = api().await;
    let storefront = api.storefront().unwrap();
    let mut changes = storefront.session().subscribe();

    let (snapshot, navigation) = AuthService::new(&storefront)
        .sign_in(&login(USER, PASSWORD))
        .await
        .unwrap();

    assert!(snapshot.is_logged_in);
    assert_eq!(snapshot.role, Some(Role::User));
    assert!(!snapshot.is_admin());
    assert_eq!(navigation.to, Route::Products);
    assert!(navigation.after.is_zero());
    assert_eq!(
        storefront.session().token().unwrap().expose_secret(),
        "user-token"
    );

    assert!(changes.has_changed().unwrap());
    assert_eq!(*changes.borrow_and_update(), snapshot);
}

#[tokio::test]
async fn test_admin_role_from_profile() {
    let api = api().await;
    let storefront = api.storefront().unwrap();
    sign_in(&storefront, ADMIN, PASSWORD).await;

    assert!(storefront.snapshot().is_admin());
    assert_eq!(
        Router::resolve(Route::AddProduct, &storefront.snapshot()),
        Route::AddProduct
    );
}

#[tokio::test]
async fn test_token_read_from_body_when_header_missing() {
    let api = MockApi::builder()
        .account(USER, PASSWORD, "body-token", &["USER"])
        .token_in_body()
        .start()
        .await
        .unwrap();
    let storefront = api.storefront().unwrap();
    sign_in(&storefront, USER, PASSWORD).await;

    assert_eq!(
        storefront.session().token().unwrap().expose_secret(),
        "body-token"
    );
}

#[tokio::test]
async fn test_rejected_sign_in_shows_server_message() {
    let api = api().await;
    let storefront = api.storefront().unwrap();

    let err = AuthService::new(&storefront)
        .sign_in(&login(USER, "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(!storefront.snapshot().is_logged_in);
    assert!(storefront.session().token().is_none());
}

#[tokio::test]
async fn test_sign_in_failure_without_message_uses_fallback() {
    let api = api().await;
    api.fail(
        Method::POST,
        "/auth/signin",
        StatusCode::INTERNAL_SERVER_ERROR,
        "",
    );
    let storefront = api.storefront().unwrap();

    let err = AuthService::new(&storefront)
        .sign_in(&login(USER, PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Login failed. Please try again.");
}

#[tokio::test]
async fn test_incomplete_login_form_sends_nothing() {
    let api = api().await;
    let storefront = api.storefront().unwrap();

    let err = AuthService::new(&storefront)
        .sign_in(&login("", ""))
        .await
        .unwrap_err();

    let AuthError::Invalid(errors) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.get("username"), Some("Email is required"));
    assert_eq!(errors.get("password"), Some("Password is required"));
    assert!(api.requests().is_empty());
}

// =============================================================================
// Sign-up
// =============================================================================

#[tokio::test]
async fn test_sign_up_then_sign_in() {
    let api = api().await;
    let storefront = api.storefront().unwrap();

    let (notice, navigation) = AuthService::new(&storefront)
        .sign_up(&signup("new@example.com"))
        .await
        .unwrap();

    assert_eq!(notice.message, SIGNUP_SUCCESS);
    assert_eq!(navigation.to, Route::Login);
    assert_eq!(navigation.after, REDIRECT_DELAY);
    assert!(api.has_account("new@example.com"));
    assert!(!storefront.snapshot().is_logged_in);

    sign_in(&storefront, "new@example.com", "pw-2").await;
    assert_eq!(storefront.snapshot().role, Some(Role::User));
}

#[tokio::test]
async fn test_duplicate_sign_up_shows_server_message() {
    let api = api().await;
    let storefront = api.storefront().unwrap();

    let err = AuthService::new(&storefront)
        .sign_up(&signup(USER))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Rejected { .. }));
    assert_eq!(err.to_string(), "Email already exists");
}

#[tokio::test]
async fn test_sign_up_reports_first_failing_rule() {
    let api = api().await;
    let storefront = api.storefront().unwrap();
    let form = SignupForm {
        confirm_password: "other".to_string(),
        contact_number: "123".to_string(),
        ..signup("new@example.com")
    };

    let err = AuthService::new(&storefront).sign_up(&form).await.unwrap_err();

    assert_eq!(err.to_string(), "Passwords do not match");
    assert!(api.requests().is_empty());
}

// =============================================================================
// Logout and routing
// =============================================================================

#[tokio::test]
async fn test_logout_ends_session() {
    let api = api().await;
    let storefront = api.storefront().unwrap();
    sign_in(&storefront, ADMIN, PASSWORD).await;
    let generation = storefront.snapshot().generation;

    let navigation = AuthService::new(&storefront).logout().unwrap();

    assert_eq!(navigation.to, Route::Login);
    let snapshot = storefront.snapshot();
    assert!(!snapshot.is_logged_in);
    assert!(snapshot.role.is_none());
    assert!(snapshot.generation > generation);
    assert!(storefront.session().token().is_none());

    api.clear_requests();
    let mut catalog = CatalogView::new(storefront.clone());
    assert_eq!(catalog.load().await.unwrap().to, Route::Login);
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_routes_follow_session() {
    let api = api().await;
    let storefront = api.storefront().unwrap();
    let detail = Route::parse("/products/p1?ref=home");
    assert_eq!(detail, Route::ProductDetail(ProductId::new("p1")));

    assert_eq!(Router::resolve(Route::Home, &storefront.snapshot()), Route::Login);
    assert_eq!(
        Router::resolve(detail.clone(), &storefront.snapshot()),
        detail
    );
    assert_eq!(
        Router::resolve(Route::AddProduct, &storefront.snapshot()),
        Route::Login
    );

    sign_in(&storefront, USER, PASSWORD).await;
    let snapshot = storefront.snapshot();
    assert_eq!(Router::resolve(Route::Home, &snapshot), Route::Products);
    assert_eq!(Router::resolve(Route::Login, &snapshot), Route::Products);
    assert_eq!(Router::resolve(detail.clone(), &snapshot), detail);
    assert_eq!(
        Router::resolve(Route::ModifyProduct(ProductId::new("p1")), &snapshot),
        Route::Products
    );
    assert_eq!(
        Router::resolve(Route::parse("/nowhere"), &snapshot),
        Route::NotFound
    );
}
