//! Credential selection for authenticated API calls.
//!
//! A call is tried first with the configured default credential for the
//! required privilege. If that fails for any reason it is retried exactly
//! once with the token the session holds at that moment. There is no delay
//! between the attempts and never a third one.

use std::future::Future;

use secrecy::SecretString;
use tracing::{debug, warn};

use eshop_core::Privilege;

use crate::api::ApiError;
use crate::config::DefaultCredentials;
use crate::session::SessionStore;

/// Runs API calls with the default-then-session credential policy.
#[derive(Clone)]
pub struct AuthorizedRequests {
    defaults: DefaultCredentials,
    session: SessionStore,
}

impl AuthorizedRequests {
    #[must_use]
    pub const fn new(defaults: DefaultCredentials, session: SessionStore) -> Self {
        Self { defaults, session }
    }

    /// Issue `call` with a token suitable for `privilege`.
    ///
    /// # Errors
    ///
    /// Returns the session-token attempt's error when both attempts fail, or
    /// `ApiError::NoCredential` when the default attempt failed (or is not
    /// configured) and the session holds no token.
    pub async fn run<T, F, Fut>(&self, privilege: Privilege, call: F) -> Result<T, ApiError>
    where
        F: Fn(SecretString) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(default) = self.defaults.for_privilege(privilege) {
            match call(default.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) => warn!(
                    privilege = %privilege,
                    error = %e,
                    "Default credential failed, retrying with session token"
                ),
            }
        } else {
            debug!(privilege = %privilege, "No default credential configured");
        }

        let token = self.session.token().ok_or(ApiError::NoCredential)?;
        call(token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};

    use eshop_core::{UserId, UserProfile};
    use secrecy::ExposeSecret;

    use super::*;
    use crate::session::MemoryStorage;

    fn session(token: Option<&str>) -> SessionStore {
        let store = SessionStore::open(Arc::new(MemoryStorage::new()));
        if let Some(token) = token {
            let profile = UserProfile {
                id: UserId::new("u1"),
                email: "a@b.c".to_string(),
                roles: BTreeSet::new(),
            };
            store.login(SecretString::from(token), profile).unwrap();
        }
        store
    }

    fn defaults(admin: Option<&str>) -> DefaultCredentials {
        DefaultCredentials {
            user: None,
            admin: admin.map(SecretString::from),
        }
    }

    /// Records every token it is called with and fails unless the token is `accept`.
    fn recording(
        accept: &'static str,
        seen: &Arc<Mutex<Vec<String>>>,
    ) -> impl Fn(SecretString) -> std::future::Ready<Result<&'static str, ApiError>> {
        let seen = Arc::clone(seen);
        move |token: SecretString| {
            let token = token.expose_secret().to_string();
            seen.lock().unwrap().push(token.clone());
            std::future::ready(if token == accept {
                Ok("ok")
            } else {
                Err(ApiError::Unauthorized(format!("rejected {token}")))
            })
        }
    }

    #[tokio::test]
    async fn test_default_credential_succeeds_first() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let requests = AuthorizedRequests::new(defaults(Some("svc-admin")), session(Some("mine")));

        let result = requests
            .run(Privilege::Admin, recording("svc-admin", &seen))
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(*seen.lock().unwrap(), vec!["svc-admin"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_session_token() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let requests = AuthorizedRequests::new(defaults(Some("svc-admin")), session(Some("mine")));

        let result = requests.run(Privilege::Admin, recording("mine", &seen)).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(*seen.lock().unwrap(), vec!["svc-admin", "mine"]);
    }

    #[tokio::test]
    async fn test_second_error_is_surfaced_after_two_attempts() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let requests = AuthorizedRequests::new(defaults(Some("svc-admin")), session(Some("mine")));

        let err = requests
            .run(Privilege::Admin, recording("nobody", &seen))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unauthorized: rejected mine");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_session_token_fails_without_second_attempt() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let requests = AuthorizedRequests::new(defaults(Some("svc-admin")), session(None));

        let err = requests
            .run(Privilege::Admin, recording("nobody", &seen))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NoCredential));
        assert_eq!(*seen.lock().unwrap(), vec!["svc-admin"]);
    }

    #[tokio::test]
    async fn test_unconfigured_default_uses_session_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let requests = AuthorizedRequests::new(defaults(Some("svc-admin")), session(Some("mine")));

        let result = requests.run(Privilege::User, recording("mine", &seen)).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(*seen.lock().unwrap(), vec!["mine"]);
    }

    #[tokio::test]
    async fn test_unconfigured_default_without_session_is_no_credential() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let requests = AuthorizedRequests::new(defaults(None), session(None));

        let err = requests
            .run(Privilege::User, recording("mine", &seen))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NoCredential));
        assert!(seen.lock().unwrap().is_empty());
    }
}
