//! HTTP client for the eShop REST API.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;
use uuid::Uuid;

use eshop_core::{
    Address, NewAddress, NewOrder, Order, Product, ProductId, ProductInput, SignupRequest,
    UserProfile,
};

use super::ApiError;
use super::cache::{CacheKey, CacheValue};
use crate::config::StorefrontConfig;

/// Header carrying the credential on authenticated requests.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Correlation id sent with every request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Maximum number of body characters copied into logs.
const LOGGED_BODY_CHARS: usize = 500;

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: SecretString,
    pub profile: UserProfile,
}

#[derive(Serialize)]
struct SignInBody<'a> {
    username: &'a str,
    password: &'a str,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the eShop REST API.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.category_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL every path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an absolute URL from path segments; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and turn non-success statuses into [`ApiError`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        let response = request
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, request_id = %request_id, "eShop API responded");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                request_id = %request_id,
                body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "eShop API returned non-success status"
            );
            return Err(ApiError::from_status(status, error_message(&body)));
        }

        Ok(response)
    }

    /// Send a request and decode the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "Failed to parse eShop API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    async fn send_discarding_body(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(drop)
    }

    fn authorized(&self, request: RequestBuilder, token: &SecretString) -> RequestBuilder {
        request.header(AUTH_HEADER, token.expose_secret())
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Sign in with username (email) and password.
    ///
    /// The session token is read from the `x-auth-token` response header,
    /// falling back to a `token` field in the body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials and
    /// `ApiError::MissingToken` if the server sent no token.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<SignedIn, ApiError> {
        let url = self.endpoint(&["auth", "signin"])?;
        let body = SignInBody {
            username,
            password: password.expose_secret(),
        };
        let response = self.send(self.inner.client.post(url).json(&body)).await?;

        let header_token = response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let text = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let body_token = value
            .get("token")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);

        let token = header_token
            .or(body_token)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ApiError::MissingToken)?;
        let profile: UserProfile = serde_json::from_value(value)?;

        Ok(SignedIn {
            token: SecretString::from(token),
            profile,
        })
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the registration.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(&self, request: &SignupRequest) -> Result<(), ApiError> {
        let url = self.endpoint(&["auth", "signup"])?;
        self.send_discarding_body(self.inner.client.post(url).json(request))
            .await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a product list.
    #[instrument(skip(self, token))]
    pub async fn list_products(&self, token: &SecretString) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint(&["products"])?;
        self.send_json(self.authorized(self.inner.client.get(url), token))
            .await
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        id: &ProductId,
        token: &SecretString,
    ) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        self.send_json(self.authorized(self.inner.client.get(url), token))
            .await
    }

    /// List product categories. Public and cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["products", "categories"])?;
        let categories: Vec<String> = self.send_json(self.inner.client.get(url)).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Drop the cached category list, e.g. after a product changed category
    /// or the last product of a category was deleted.
    pub async fn invalidate_categories(&self) {
        self.inner.cache.invalidate(&CacheKey::Categories).await;
    }

    /// Create a product (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token lacks admin rights.
    #[instrument(skip(self, input, token), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: &ProductInput,
        token: &SecretString,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["products"])?;
        self.send_discarding_body(self.authorized(self.inner.client.post(url).json(input), token))
            .await?;
        self.invalidate_categories().await;
        Ok(())
    }

    /// Replace a product's editable fields (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token lacks admin rights.
    #[instrument(skip(self, input, token), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        input: &ProductInput,
        token: &SecretString,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        self.send_discarding_body(self.authorized(self.inner.client.put(url).json(input), token))
            .await?;
        self.invalidate_categories().await;
        Ok(())
    }

    /// Delete a product (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token lacks admin rights.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        id: &ProductId,
        token: &SecretString,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        self.send_discarding_body(self.authorized(self.inner.client.delete(url), token))
            .await?;
        self.invalidate_categories().await;
        Ok(())
    }

    // =========================================================================
    // Address Methods
    // =========================================================================

    /// List the caller's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a list.
    #[instrument(skip(self, token))]
    pub async fn list_addresses(&self, token: &SecretString) -> Result<Vec<Address>, ApiError> {
        let url = self.endpoint(&["addresses"])?;
        self.send_json(self.authorized(self.inner.client.get(url), token))
            .await
    }

    /// Save a new address and return the server's record of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the address.
    #[instrument(skip(self, address, token))]
    pub async fn create_address(
        &self,
        address: &NewAddress,
        token: &SecretString,
    ) -> Result<Address, ApiError> {
        let url = self.endpoint(&["addresses"])?;
        self.send_json(self.authorized(self.inner.client.post(url).json(address), token))
            .await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order for a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses the order (e.g. insufficient stock).
    #[instrument(skip(self, order, token), fields(product_id = %order.product, quantity = order.quantity.get()))]
    pub async fn create_order(
        &self,
        order: &NewOrder,
        token: &SecretString,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders"])?;
        self.send_json(self.authorized(self.inner.client.post(url).json(order), token))
            .await
    }
}

/// Pull the `message` field out of an error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&StorefrontConfig::new(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("http://localhost:8080/api");
        let url = client.endpoint(&["products", "categories"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/products/categories");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let client = client("http://localhost:8080");
        let url = client.endpoint(&["products", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/products/a%2Fb%20c");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Bad credentials"}"#),
            Some("Bad credentials".to_string())
        );
        assert_eq!(error_message(r#"{"message":"  "}"#), None);
        assert_eq!(error_message("<html>oops</html>"), None);
    }
}
