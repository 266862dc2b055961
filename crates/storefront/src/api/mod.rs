//! eShop REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`
//! - The server is the source of truth - no local sync of products, addresses
//!   or orders
//! - The public category list is cached in memory via `moka`
//! - Authenticated calls take the token explicitly; choosing which token to
//!   send is the job of [`crate::credentials::AuthorizedRequests`]
//!
//! # Endpoints
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | `POST` | `/auth/signin`, `/auth/signup` | none |
//! | `GET` | `/products/categories` | none |
//! | `GET` | `/products`, `/products/:id` | `x-auth-token` |
//! | `POST`, `PUT`, `DELETE` | `/products`, `/products/:id` | `x-auth-token` (admin) |
//! | `GET`, `POST` | `/addresses` | `x-auth-token` |
//! | `POST` | `/orders` | `x-auth-token` |
//!
//! # Example
//!
//! ```rust,ignore
//! use eshop_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config)?;
//! let categories = client.list_categories().await?;
//! let product = client.get_product(&ProductId::new("p1"), &token).await?;
//! ```

mod cache;
mod client;

pub use client::{ApiClient, AUTH_HEADER, REQUEST_ID_HEADER, SignedIn};

use reqwest::StatusCode;
use thiserror::Error;

/// Shown whenever the server rejects the credential.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized. Please check admin permissions.";

/// Errors that can occur when talking to the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection refused, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot take path segments.
    #[error("API base URL cannot be used for request paths")]
    InvalidBaseUrl,

    /// 401 or 403 from the server.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the server.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Status code returned by the server.
        status: u16,
        /// Server-provided message, or the status reason.
        message: String,
    },

    /// Neither a default credential nor a session token could be used.
    #[error("No credential available and the default credential failed")]
    NoCredential,

    /// Sign-in succeeded but the response carried no session token.
    #[error("Sign-in response did not include a session token")]
    MissingToken,
}

impl ApiError {
    /// Build the error for a non-success response.
    pub(crate) fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Status {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Whether the server rejected the credential (HTTP 401/403).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// User-facing text for a failed `action` ("delete product", "add product").
    ///
    /// Credential rejections get the permissions message; everything else,
    /// including [`ApiError::NoCredential`], gets the generic retry text.
    #[must_use]
    pub fn user_message(&self, action: &str) -> String {
        if self.is_unauthorized() {
            UNAUTHORIZED_MESSAGE.to_string()
        } else {
            format!("Failed to {action}. Please try again.")
        }
    }

    /// Message the server put in its error body, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized(m) | Self::NotFound(m) | Self::Status { message: m, .. } => {
                Some(m.as_str())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("product p9".to_string());
        assert_eq!(err.to_string(), "Not found: product p9");
    }

    #[test]
    fn test_from_status_classifies() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, None).is_unauthorized());
        assert!(ApiError::from_status(StatusCode::FORBIDDEN, None).is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, None),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, Some("bad".to_string())),
            ApiError::Status { status: 400, .. }
        ));
    }

    #[test]
    fn test_server_message() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            Some("Product is out of stock".to_string()),
        );
        assert_eq!(err.server_message(), Some("Product is out of stock"));
        assert_eq!(ApiError::NoCredential.server_message(), None);
    }

    #[test]
    fn test_from_status_uses_reason_when_no_body() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    }

    #[test]
    fn test_user_message() {
        let unauthorized = ApiError::Unauthorized("nope".to_string());
        assert_eq!(unauthorized.user_message("delete product"), UNAUTHORIZED_MESSAGE);
        assert_eq!(
            ApiError::NoCredential.user_message("delete product"),
            "Failed to delete product. Please try again."
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
