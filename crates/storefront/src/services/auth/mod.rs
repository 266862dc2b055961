//! Authentication service.
//!
//! Sign-in and sign-up against the REST API, and the session lifecycle that
//! follows them.

mod error;

pub use error::AuthError;

use tracing::{info, instrument, warn};

use crate::forms::{LoginForm, SignupForm};
use crate::routes::Route;
use crate::session::SessionSnapshot;
use crate::state::Storefront;
use crate::views::{Navigation, Notice};

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const SIGNUP_FAILED: &str = "Signup failed. Please try again.";

/// Shown after a successful registration.
pub const SIGNUP_SUCCESS: &str = "Signup successful. Please login.";

/// Authentication service.
pub struct AuthService<'a> {
    storefront: &'a Storefront,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(storefront: &'a Storefront) -> Self {
        Self { storefront }
    }

    /// Sign in and start a session, then head to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` for an incomplete form,
    /// `AuthError::Rejected` with the server's message (or a generic one) when
    /// sign-in fails, and `AuthError::Session` if the session cannot be saved.
    #[instrument(skip(self, form), fields(username = %form.username.trim()))]
    pub async fn sign_in(
        &self,
        form: &LoginForm,
    ) -> Result<(SessionSnapshot, Navigation), AuthError> {
        let request = form.validate().map_err(AuthError::Invalid)?;

        let signed_in = self
            .storefront
            .api()
            .sign_in(&request.username, &request.password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Sign-in failed");
                AuthError::rejected(e, LOGIN_FAILED)
            })?;

        let snapshot = self
            .storefront
            .session()
            .login(signed_in.token, signed_in.profile)?;
        Ok((snapshot, Navigation::now(Route::Products)))
    }

    /// Register an account. On success the user is sent to sign-in after the
    /// usual delay.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` with the first failing rule, or
    /// `AuthError::Rejected` when the server refuses the registration.
    #[instrument(skip(self, form))]
    pub async fn sign_up(&self, form: &SignupForm) -> Result<(Notice, Navigation), AuthError> {
        let request = form.validate().map_err(AuthError::Invalid)?;

        self.storefront
            .api()
            .sign_up(&request)
            .await
            .map_err(|e| {
                warn!(error = %e, "Sign-up failed");
                AuthError::rejected(e, SIGNUP_FAILED)
            })?;

        info!(email = %request.email, "Account created");
        Ok((
            Notice::success(SIGNUP_SUCCESS),
            Navigation::delayed(Route::Login),
        ))
    }

    /// End the session and return to sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable slots cannot be cleared. The
    /// in-memory session is gone either way.
    pub fn logout(&self) -> Result<Navigation, AuthError> {
        self.storefront.session().logout()?;
        Ok(Navigation::now(Route::Login))
    }
}
