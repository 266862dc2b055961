//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::forms::ValidationErrors;
use crate::session::SessionError;

/// Errors that can occur during sign-in, sign-up and logout.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The form failed client-side validation; nothing was sent.
    #[error("{0}")]
    Invalid(ValidationErrors),

    /// The server refused the request. `message` is what the user sees.
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },

    /// The session could not be persisted or cleared.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl AuthError {
    pub(crate) fn rejected(source: ApiError, fallback: &str) -> Self {
        let message = source.server_message().unwrap_or(fallback).to_string();
        Self::Rejected { message, source }
    }
}
