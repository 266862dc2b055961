//! Subcommand implementations.
//!
//! Each command drives the same view models a graphical front end would and
//! prints the result. Navigation returned by a view is reported, not
//! followed, except where the command itself is the next screen.

pub mod auth;
pub mod catalog;
pub mod navigate;
pub mod order;
pub mod product;

use thiserror::Error;

use eshop_storefront::routes::Route;
use eshop_storefront::services::auth::AuthError;
use eshop_storefront::views::Navigation;
use eshop_storefront::views::catalog::UnknownSortOption;
use eshop_storefront::views::checkout::WorkflowError;
use eshop_storefront::views::product_detail::DetailError;
use eshop_storefront::views::product_editor::EditorError;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Detail(#[from] DetailError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Checkout(#[from] WorkflowError),

    #[error(transparent)]
    Sort(#[from] UnknownSortOption),

    /// The screen redirected away, usually to sign-in.
    #[error("Redirected to {0}")]
    Redirected(Route),

    /// A view finished in an error state.
    #[error("{0}")]
    Failed(String),
}

/// Report where the storefront would go next.
fn report_navigation(navigation: &Navigation) {
    if navigation.after.is_zero() {
        tracing::debug!(to = %navigation.to, "Navigating");
    } else {
        tracing::debug!(
            to = %navigation.to,
            delay_ms = u64::try_from(navigation.after.as_millis()).unwrap_or(u64::MAX),
            "Navigating after delay"
        );
    }
}
