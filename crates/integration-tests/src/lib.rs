//! Integration tests for the eShop storefront.
//!
//! The tests run the storefront view models against [`MockApi`], an in-process
//! `axum` server that speaks the same REST dialect as the real backend and
//! records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eshop-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let api = MockApi::builder()
//!     .product(product("p1", "Shoe", "Apparel", 5, "100"))
//!     .account("user@example.com", "pw", "user-token", &["USER"])
//!     .start()
//!     .await?;
//! let storefront = api.storefront()?;
//! sign_in(&storefront, "user@example.com", "pw").await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use eshop_core::{
    Address, AddressId, Order, OrderId, Price, Product, ProductId, ProductInput, UserId,
    UserProfile,
};
use eshop_storefront::api::{ApiError, AUTH_HEADER, REQUEST_ID_HEADER};
use eshop_storefront::config::DefaultCredentials;
use eshop_storefront::forms::LoginForm;
use eshop_storefront::services::auth::AuthService;
use eshop_storefront::session::MemoryStorage;
use eshop_storefront::{Storefront, StorefrontConfig};

/// Every mock route lives under this prefix, like a backend behind `/api`.
const API_PREFIX: &str = "/api";

// =============================================================================
// Fixtures
// =============================================================================

/// A product with the fields the tests care about.
#[must_use]
pub fn product(id: &str, name: &str, category: &str, available: u32, price: &str) -> Product {
    let amount = Decimal::from_str(price).expect("fixture price must be a decimal");
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: category.to_string(),
        manufacturer: "Acme".to_string(),
        available_items: available,
        price: Price::new(amount).expect("fixture price must not be negative"),
        image_url: String::new(),
        description: format!("{name} description"),
        created_at: None,
    }
}

/// A saved address.
#[must_use]
pub fn address(id: &str, name: &str) -> Address {
    Address {
        id: AddressId::new(id),
        name: name.to_string(),
        contact_number: "9999999999".to_string(),
        street: "1 Main St".to_string(),
        city: "Pune".to_string(),
        state: "MH".to_string(),
        zipcode: "411001".to_string(),
        landmark: None,
    }
}

/// Sign in through the auth service, panicking on failure.
pub async fn sign_in(storefront: &Storefront, username: &str, password: &str) {
    let form = LoginForm {
        username: username.to_string(),
        password: password.to_string(),
    };
    AuthService::new(storefront)
        .sign_in(&form)
        .await
        .expect("fixture sign-in must succeed");
}

// =============================================================================
// Recorded traffic
// =============================================================================

/// One request as seen by the mock, path relative to the API base.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub token: Option<String>,
    pub request_id: Option<String>,
}

impl RecordedRequest {
    #[must_use]
    pub fn is(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.path == path
    }
}

// =============================================================================
// Mock state
// =============================================================================

struct Account {
    password: String,
    token: String,
}

#[derive(Default)]
struct Data {
    products: Vec<Product>,
    categories: Vec<String>,
    accounts: HashMap<String, Account>,
    /// Token to profile; service tokens have no account.
    tokens: HashMap<String, UserProfile>,
    addresses: Vec<Address>,
    orders: Vec<Order>,
    failures: HashMap<(Method, String), (StatusCode, String)>,
    /// Sign-in returns the token in the body instead of the header.
    token_in_body: bool,
    next_id: u32,
}

impl Data {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn add_token(&mut self, token: &str, email: &str, roles: &[&str]) -> UserProfile {
        let profile = UserProfile {
            id: UserId::new(format!("u-{email}")),
            email: email.to_string(),
            roles: roles.iter().map(ToString::to_string).collect::<BTreeSet<_>>(),
        };
        self.tokens.insert(token.to_string(), profile.clone());
        profile
    }
}

#[derive(Default)]
struct MockState {
    data: Mutex<Data>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn data(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn requests(&self) -> MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Shared = Arc<MockState>;

// =============================================================================
// Builder
// =============================================================================

/// Configures the data a [`MockApi`] starts with.
#[derive(Default)]
pub struct MockApiBuilder {
    data: Data,
}

impl MockApiBuilder {
    #[must_use]
    pub fn product(mut self, product: Product) -> Self {
        self.data.products.push(product);
        self
    }

    #[must_use]
    pub fn categories(mut self, categories: &[&str]) -> Self {
        self.data.categories = categories.iter().map(ToString::to_string).collect();
        self
    }

    /// An account that can sign in and the token it receives.
    #[must_use]
    pub fn account(mut self, email: &str, password: &str, token: &str, roles: &[&str]) -> Self {
        self.data.add_token(token, email, roles);
        self.data.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                token: token.to_string(),
            },
        );
        self
    }

    /// A token the server accepts without any account behind it.
    #[must_use]
    pub fn service_token(mut self, token: &str, roles: &[&str]) -> Self {
        self.data.add_token(token, "service@eshop.test", roles);
        self
    }

    #[must_use]
    pub fn address(mut self, address: Address) -> Self {
        self.data.addresses.push(address);
        self
    }

    /// Answer `method path` with `status` and a `{"message"}` body.
    #[must_use]
    pub fn fail(mut self, method: Method, path: &str, status: StatusCode, message: &str) -> Self {
        self.data
            .failures
            .insert((method, path.to_string()), (status, message.to_string()));
        self
    }

    /// Put the sign-in token in the response body rather than the header.
    #[must_use]
    pub const fn token_in_body(mut self) -> Self {
        self.data.token_in_body = true;
        self
    }

    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(self) -> std::io::Result<MockApi> {
        let state: Shared = Arc::new(MockState {
            data: Mutex::new(self.data),
            requests: Mutex::default(),
        });

        let api = Router::new()
            .route("/auth/signin", post(sign_in_handler))
            .route("/auth/signup", post(sign_up_handler))
            .route("/products", get(list_products).post(create_product))
            .route("/products/categories", get(list_categories))
            .route(
                "/products/{id}",
                get(get_product).put(update_product).delete(delete_product),
            )
            .route("/addresses", get(list_addresses).post(create_address))
            .route("/orders", post(create_order));

        let app = Router::new()
            .nest(API_PREFIX, api)
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}{API_PREFIX}", listener.local_addr()?);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(MockApi { base_url, state })
    }
}

// =============================================================================
// MockApi
// =============================================================================

/// A running mock of the eShop REST API.
pub struct MockApi {
    base_url: String,
    state: Shared,
}

impl MockApi {
    #[must_use]
    pub fn builder() -> MockApiBuilder {
        MockApiBuilder::default()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::new(&self.base_url).expect("mock URL must be a valid API base")
    }

    /// A storefront with an empty in-memory session and no default credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn storefront(&self) -> Result<Storefront, ApiError> {
        self.storefront_with(DefaultCredentials::default())
    }

    /// A storefront that tries `credentials` before the session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn storefront_with(&self, credentials: DefaultCredentials) -> Result<Storefront, ApiError> {
        let mut config = self.config();
        config.default_credentials = credentials;
        Storefront::new(config, Arc::new(MemoryStorage::new()))
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests().clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.state
            .requests()
            .iter()
            .filter(|r| r.is(method, path))
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.requests().clear();
    }

    /// Start failing `method path` from now on.
    pub fn fail(&self, method: Method, path: &str, status: StatusCode, message: &str) {
        self.state
            .data()
            .failures
            .insert((method, path.to_string()), (status, message.to_string()));
    }

    /// Stop failing `method path`.
    pub fn recover(&self, method: Method, path: &str) {
        self.state
            .data()
            .failures
            .remove(&(method, path.to_string()));
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.state.data().products.clone()
    }

    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.state.data().addresses.clone()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.state.data().orders.clone()
    }

    #[must_use]
    pub fn has_account(&self, email: &str) -> bool {
        self.state.data().accounts.contains_key(email)
    }
}

// =============================================================================
// Middleware
// =============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = {
        let path = request.uri().path();
        let headers = request.headers();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        RecordedRequest {
            method: request.method().clone(),
            path: path.strip_prefix(API_PREFIX).unwrap_or(path).to_string(),
            token: header(AUTH_HEADER),
            request_id: header(REQUEST_ID_HEADER),
        }
    };

    let failure = state
        .data()
        .failures
        .get(&(recorded.method.clone(), recorded.path.clone()))
        .cloned();
    state.requests().push(recorded);

    if let Some((status, message)) = failure {
        return error(status, &message);
    }
    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Profile behind the request's token.
fn caller(state: &MockState, headers: &HeaderMap) -> Result<UserProfile, Response> {
    headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|token| state.data().tokens.get(token).cloned())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Invalid or missing token"))
}

fn admin(state: &MockState, headers: &HeaderMap) -> Result<UserProfile, Response> {
    let profile = caller(state, headers)?;
    if profile.role().is_admin() {
        Ok(profile)
    } else {
        Err(error(StatusCode::FORBIDDEN, "Admin access required"))
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
struct SignInBody {
    username: String,
    password: String,
}

async fn sign_in_handler(State(state): State<Shared>, Json(body): Json<SignInBody>) -> Response {
    let data = state.data();
    let Some(account) = data
        .accounts
        .get(&body.username)
        .filter(|a| a.password == body.password)
    else {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };
    let Some(profile) = data.tokens.get(&account.token) else {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Account has no profile");
    };

    let mut body = json!(profile);
    if data.token_in_body {
        body["token"] = json!(account.token);
        Json(body).into_response()
    } else {
        ([(AUTH_HEADER, account.token.clone())], Json(body)).into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpBody {
    email: String,
    password: String,
}

async fn sign_up_handler(State(state): State<Shared>, Json(body): Json<SignUpBody>) -> Response {
    let mut data = state.data();
    if data.accounts.contains_key(&body.email) {
        return error(StatusCode::BAD_REQUEST, "Email already exists");
    }
    let token = data.next_id("token");
    data.add_token(&token, &body.email, &["USER"]);
    data.accounts.insert(
        body.email,
        Account {
            password: body.password,
            token,
        },
    );
    (StatusCode::OK, Json(json!({ "message": "User registered" }))).into_response()
}

async fn list_categories(State(state): State<Shared>) -> Response {
    Json(state.data().categories.clone()).into_response()
}

async fn list_products(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    Json(state.data().products.clone()).into_response()
}

async fn get_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    let data = state.data();
    data.products
        .iter()
        .find(|p| p.id.as_str() == id)
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Product not found"),
            |p| Json(p).into_response(),
        )
}

async fn create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(input): Json<ProductInput>,
) -> Response {
    if let Err(response) = admin(&state, &headers) {
        return response;
    }
    let mut data = state.data();
    let id = data.next_id("product");
    let product = Product {
        id: ProductId::new(id),
        name: input.name,
        category: input.category,
        manufacturer: input.manufacturer,
        available_items: input.available_items,
        price: input.price,
        image_url: input.image_url,
        description: input.description,
        created_at: None,
    };
    if !data.categories.contains(&product.category) {
        data.categories.push(product.category.clone());
    }
    data.products.push(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ProductInput>,
) -> Response {
    if let Err(response) = admin(&state, &headers) {
        return response;
    }
    let mut data = state.data();
    let Some(product) = data.products.iter_mut().find(|p| p.id.as_str() == id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    product.name = input.name;
    product.category = input.category;
    product.manufacturer = input.manufacturer;
    product.available_items = input.available_items;
    product.price = input.price;
    product.image_url = input.image_url;
    product.description = input.description;
    Json(product.clone()).into_response()
}

async fn delete_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = admin(&state, &headers) {
        return response;
    }
    let mut data = state.data();
    let Some(index) = data.products.iter().position(|p| p.id.as_str() == id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    let removed = data.products.remove(index);
    // Categories exist only while some product uses them
    if !data.products.iter().any(|p| p.category == removed.category) {
        data.categories.retain(|c| *c != removed.category);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_addresses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    Json(state.data().addresses.clone()).into_response()
}

async fn create_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    let text = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let mut data = state.data();
    let address = Address {
        id: AddressId::new(data.next_id("address")),
        name: text("name"),
        contact_number: text("contactNumber"),
        street: text("street"),
        city: text("city"),
        state: text("state"),
        zipcode: text("zipcode"),
        landmark: Some(text("landmark")).filter(|l| !l.is_empty()),
    };
    data.addresses.push(address.clone());
    (StatusCode::CREATED, Json(address)).into_response()
}

#[derive(Deserialize)]
struct OrderBody {
    product: String,
    quantity: u32,
    address: String,
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<OrderBody>,
) -> Response {
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    let mut data = state.data();
    if !data.addresses.iter().any(|a| a.id.as_str() == body.address) {
        return error(StatusCode::BAD_REQUEST, "Address not found");
    }
    let Some(product) = data
        .products
        .iter_mut()
        .find(|p| p.id.as_str() == body.product)
    else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    if body.quantity > product.available_items {
        let message = format!("Only {} items available", product.available_items);
        return error(StatusCode::BAD_REQUEST, &message);
    }
    product.available_items -= body.quantity;

    let order = Order {
        id: OrderId::new(data.next_id("order")),
        product: Some(ProductId::new(body.product)),
        quantity: Some(body.quantity),
        address: Some(AddressId::new(body.address)),
    };
    data.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}
