//! Shared storefront context handed to every view.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::credentials::AuthorizedRequests;
use crate::session::{FileStorage, SessionSnapshot, SessionStorage, SessionStore};

/// Storefront context shared by all views.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the API client and the session.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    api: ApiClient,
    session: SessionStore,
    authorized: AuthorizedRequests,
}

impl Storefront {
    /// Create a storefront whose session lives in `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let session = SessionStore::open(storage);
        let authorized =
            AuthorizedRequests::new(config.default_credentials.clone(), session.clone());

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                session,
                authorized,
            }),
        })
    }

    /// Create a storefront persisting its session under `config.session_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, ApiError> {
        let storage = Arc::new(FileStorage::new(&config.session_dir));
        Self::new(config, storage)
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn authorized(&self) -> &AuthorizedRequests {
        &self.inner.authorized
    }

    /// Shorthand for `self.session().current()`.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.current()
    }
}
