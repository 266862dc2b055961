//! Integration tests for the catalog view and its admin delete flow.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};

use eshop_core::ProductId;
use eshop_integration_tests::{MockApi, product, sign_in};
use eshop_storefront::routes::Route;
use eshop_storefront::views::SESSION_ENDED_MESSAGE;
use eshop_storefront::views::catalog::{CatalogView, CategoryFilter, SortOption};

const USER: &str = "user@example.com";
const ADMIN: &str = "admin@example.com";
const PASSWORD: &str = "pw-1";

async fn api() -> MockApi {
    MockApi::builder()
        .product(product("p1", "Running Shoe", "Apparel", 5, "100"))
        .product(product("p2", "Phone", "Electronics", 0, "300"))
        .product(product("p3", "Sandal", "Apparel", 2, "250"))
        .categories(&["Apparel", "Electronics"])
        .account(USER, PASSWORD, "user-token", &["USER"])
        .account(ADMIN, PASSWORD, "admin-token", &["USER", "ADMIN"])
        .start()
        .await
        .unwrap()
}

async fn catalog_for(api: &MockApi, username: &str) -> CatalogView {
    let storefront = api.storefront().unwrap();
    sign_in(&storefront, username, PASSWORD).await;
    let mut view = CatalogView::new(storefront);
    assert!(view.load().await.is_none());
    view
}

fn ids(view: &CatalogView) -> Vec<&str> {
    view.visible_products()
        .into_iter()
        .map(|p| p.id.as_str())
        .collect()
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_catalog_filters_and_sorts() {
    let api = api().await;
    let mut view = catalog_for(&api, USER).await;

    assert_eq!(view.category_options(), ["ALL", "Apparel", "Electronics"]);
    assert_eq!(ids(&view), ["p1", "p2", "p3"]);

    view.query.category = CategoryFilter::parse("Apparel");
    assert_eq!(ids(&view), ["p1", "p3"]);

    view.query.sort = SortOption::PriceHighToLow;
    assert_eq!(ids(&view), ["p3", "p1"]);

    view.query.keyword = "SHOE".to_string();
    assert_eq!(ids(&view), ["p1"]);

    view.query.keyword = "   ".to_string();
    assert_eq!(ids(&view), ["p3", "p1"]);

    view.query.category = CategoryFilter::All;
    view.query.keyword = "description".to_string();
    view.query.sort = SortOption::PriceLowToHigh;
    assert_eq!(ids(&view), ["p1", "p3", "p2"]);
}

#[tokio::test]
async fn test_logged_out_catalog_redirects_to_login() {
    let api = api().await;
    let mut view = CatalogView::new(api.storefront().unwrap());

    let navigation = view.load().await.unwrap();
    assert_eq!(navigation.to, Route::Login);
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_category_failure_does_not_block_products() {
    let api = api().await;
    api.fail(
        Method::GET,
        "/products/categories",
        StatusCode::INTERNAL_SERVER_ERROR,
        "boom",
    );
    let view = catalog_for(&api, USER).await;

    assert_eq!(
        view.categories().error(),
        Some("Failed to fetch categories. Please try again later.")
    );
    assert_eq!(view.category_options(), ["ALL"]);
    assert_eq!(view.products().loaded().unwrap().len(), 3);
}

#[tokio::test]
async fn test_product_failure_does_not_block_categories() {
    let api = api().await;
    api.fail(
        Method::GET,
        "/products",
        StatusCode::INTERNAL_SERVER_ERROR,
        "boom",
    );
    let view = catalog_for(&api, USER).await;

    assert_eq!(view.products().error(), Some("Failed to fetch products"));
    assert!(view.visible_products().is_empty());
    assert_eq!(view.categories().loaded().unwrap().len(), 2);
}

#[tokio::test]
async fn test_categories_are_cached() {
    let api = api().await;
    let mut view = catalog_for(&api, USER).await;
    view.load().await;

    assert_eq!(api.requests_to(&Method::GET, "/products").len(), 2);
    assert_eq!(
        api.requests_to(&Method::GET, "/products/categories").len(),
        1
    );
}

// =============================================================================
// Admin affordances and delete
// =============================================================================

#[tokio::test]
async fn test_non_admin_cannot_delete() {
    let api = api().await;
    let mut view = catalog_for(&api, USER).await;

    let affordances = view.affordances();
    assert!(!affordances.can_edit);
    assert!(!affordances.can_delete);

    assert!(!view.request_delete(&ProductId::new("p1")));
    assert!(view.pending_delete().is_none());
    assert!(!view.confirm_delete().await);
    assert!(api.requests_to(&Method::DELETE, "/products/p1").is_empty());
    assert_eq!(api.products().len(), 3);
}

#[tokio::test]
async fn test_admin_delete_refetches_catalog() {
    let api = api().await;
    let mut view = catalog_for(&api, ADMIN).await;
    assert!(view.affordances().can_delete);

    assert!(view.request_delete(&ProductId::new("p2")));
    assert_eq!(view.pending_delete().unwrap().name, "Phone");
    assert!(view.confirm_delete().await);

    assert_eq!(view.notice().unwrap().message, "Product deleted successfully");
    assert!(view.pending_delete().is_none());
    assert!(!view.is_deleting());
    assert_eq!(ids(&view), ["p1", "p3"]);
    assert_eq!(api.requests_to(&Method::GET, "/products").len(), 2);

    let deletes = api.requests_to(&Method::DELETE, "/products/p2");
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].token.as_deref(), Some("admin-token"));
}

#[tokio::test]
async fn test_cancel_delete_sends_nothing() {
    let api = api().await;
    let mut view = catalog_for(&api, ADMIN).await;

    assert!(view.request_delete(&ProductId::new("p1")));
    view.cancel_delete();
    assert!(!view.confirm_delete().await);
    assert!(api.requests_to(&Method::DELETE, "/products/p1").is_empty());
}

#[tokio::test]
async fn test_delete_failure_messages() {
    let api = api().await;
    let mut view = catalog_for(&api, ADMIN).await;

    api.fail(
        Method::DELETE,
        "/products/p1",
        StatusCode::UNAUTHORIZED,
        "Token expired",
    );
    view.request_delete(&ProductId::new("p1"));
    assert!(!view.confirm_delete().await);
    assert_eq!(
        view.notice().unwrap().message,
        "Unauthorized. Please check admin permissions."
    );

    api.fail(
        Method::DELETE,
        "/products/p1",
        StatusCode::INTERNAL_SERVER_ERROR,
        "boom",
    );
    view.request_delete(&ProductId::new("p1"));
    assert!(!view.confirm_delete().await);
    assert_eq!(
        view.notice().unwrap().message,
        "Failed to delete product. Please try again."
    );
    assert_eq!(api.products().len(), 3);
}

#[tokio::test]
async fn test_delete_refreshes_category_list() {
    let api = api().await;
    let mut view = catalog_for(&api, ADMIN).await;
    assert_eq!(view.category_options(), ["ALL", "Apparel", "Electronics"]);

    assert!(view.request_delete(&ProductId::new("p2")));
    assert!(view.confirm_delete().await);
    view.load().await;

    assert_eq!(view.category_options(), ["ALL", "Apparel"]);
    assert_eq!(
        api.requests_to(&Method::GET, "/products/categories").len(),
        2
    );
}

// =============================================================================
// Session changes
// =============================================================================

#[tokio::test]
async fn test_stale_catalog_cannot_delete() {
    let api = api().await;
    let storefront = api.storefront().unwrap();
    sign_in(&storefront, ADMIN, PASSWORD).await;
    let mut view = CatalogView::new(storefront.clone());
    view.load().await;
    assert!(view.request_delete(&ProductId::new("p1")));

    storefront.session().logout().unwrap();
    sign_in(&storefront, ADMIN, PASSWORD).await;

    assert!(!view.confirm_delete().await);
    assert!(api.requests_to(&Method::DELETE, "/products/p1").is_empty());
    assert_eq!(api.products().len(), 3);
    assert!(view.pending_delete().is_none());
    assert!(view.products().loaded().is_none());
    assert_eq!(view.notice().unwrap().message, SESSION_ENDED_MESSAGE);

    // Reloading binds the view to the new session
    assert!(view.load().await.is_none());
    assert!(view.request_delete(&ProductId::new("p1")));
    assert!(view.confirm_delete().await);
    assert_eq!(api.products().len(), 2);
}

#[tokio::test]
async fn test_logged_out_reload_drops_catalog() {
    let api = api().await;
    let storefront = api.storefront().unwrap();
    sign_in(&storefront, USER, PASSWORD).await;
    let mut view = CatalogView::new(storefront.clone());
    view.load().await;

    storefront.session().logout().unwrap();

    assert_eq!(view.load().await.unwrap().to, Route::Login);
    assert!(view.products().loaded().is_none());
    assert!(view.visible_products().is_empty());
}
