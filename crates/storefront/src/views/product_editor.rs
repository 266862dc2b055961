//! Admin add/modify product screens.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use thiserror::Error;
use tracing::{error, info, warn};

use eshop_core::{Privilege, Product, ProductId, ProductInput};

use super::{
    FetchState, InFlight, Navigation, Notice, SESSION_ENDED_MESSAGE, SessionBinding,
    clear_expired,
};
use crate::api::{ApiError, UNAUTHORIZED_MESSAGE};
use crate::forms::{ProductForm, ValidationErrors};
use crate::guard::{Access, RoleGuard};
use crate::routes::Route;
use crate::state::Storefront;

/// Offered when the category list cannot be fetched.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Apparel", "Electronics", "Personal Care", "Furniture"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Modify(ProductId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("Unauthorized. Please check admin permissions.")]
    Forbidden,

    #[error("{0}")]
    Invalid(ValidationErrors),

    #[error("A submission is already in progress")]
    SubmissionPending,

    #[error("{}", SESSION_ENDED_MESSAGE)]
    SessionEnded,

    /// A request failed; carries the message shown to the user.
    #[error("{0}")]
    Request(String),
}

/// A validated product waiting for its save request.
///
/// While this value exists the form cannot be submitted again.
#[derive(Debug)]
pub struct ProductSubmission {
    pub input: ProductInput,
    _in_flight: InFlight,
}

/// State of the add/modify product screen.
pub struct ProductEditor {
    storefront: Storefront,
    binding: SessionBinding,
    mode: EditorMode,
    pub form: ProductForm,
    form_errors: ValidationErrors,
    product: FetchState<Product>,
    categories: FetchState<Vec<String>>,
    error: Option<String>,
    submitting: Arc<AtomicBool>,
    notice: Option<Notice>,
}

impl ProductEditor {
    #[must_use]
    pub fn create(storefront: Storefront) -> Self {
        Self::new(storefront, EditorMode::Create)
    }

    #[must_use]
    pub fn modify(storefront: Storefront, id: ProductId) -> Self {
        Self::new(storefront, EditorMode::Modify(id))
    }

    fn new(storefront: Storefront, mode: EditorMode) -> Self {
        Self {
            binding: SessionBinding::bind(&storefront),
            storefront,
            mode,
            form: ProductForm::default(),
            form_errors: ValidationErrors::new(),
            product: FetchState::Idle,
            categories: FetchState::Idle,
            error: None,
            submitting: Arc::new(AtomicBool::new(false)),
            notice: None,
        }
    }

    /// Fetch categories and, when modifying, the product to prefill.
    ///
    /// Returns a redirect instead when the session is not an admin. Loading
    /// replaces all state, so it also binds the editor to the current session.
    pub async fn load(&mut self) -> Option<Navigation> {
        if let Access::RedirectTo(to) = RoleGuard::admin(&self.storefront.snapshot()) {
            if !self.binding.is_current(&self.storefront) {
                self.discard();
            }
            return Some(Navigation::now(to));
        }
        self.binding = SessionBinding::bind(&self.storefront);

        self.error = None;
        self.categories = FetchState::Loading;
        let storefront = self.storefront.clone();
        let api = storefront.api();

        match &self.mode {
            EditorMode::Create => {
                let categories = api.list_categories().await;
                self.categories = FetchState::from_result(categories, |e| {
                    warn!(error = %e, "Failed to fetch categories, using defaults");
                    "Failed to fetch categories.".to_string()
                });
            }
            EditorMode::Modify(id) => {
                self.product = FetchState::Loading;
                let (product, categories) = tokio::join!(
                    storefront
                        .authorized()
                        .run(Privilege::Admin, |token| async move {
                            api.get_product(id, &token).await
                        }),
                    api.list_categories(),
                );

                let mut errors = Vec::new();
                match product {
                    Ok(product) => {
                        self.form = ProductForm::from_product(&product);
                        self.product = FetchState::Loaded(product);
                    }
                    Err(e) => {
                        error!(product_id = %id, error = %e, "Failed to fetch product");
                        let message = "Failed to fetch product details";
                        errors.push(message);
                        self.product = FetchState::Failed(message.to_string());
                    }
                }
                self.categories = FetchState::from_result(categories, |e| {
                    error!(error = %e, "Failed to fetch categories");
                    errors.push("Failed to fetch categories.");
                    "Failed to fetch categories.".to_string()
                });
                if !errors.is_empty() {
                    self.error = Some(errors.join("\n"));
                }
            }
        }
        None
    }

    #[must_use]
    pub const fn mode(&self) -> &EditorMode {
        &self.mode
    }

    #[must_use]
    pub const fn product(&self) -> &FetchState<Product> {
        &self.product
    }

    /// Category choices: the fetched list, or the defaults when it is
    /// unavailable. The form's current category is always offered.
    #[must_use]
    pub fn category_options(&self) -> Vec<String> {
        let mut options: Vec<String> = match self.categories.loaded() {
            Some(list) if !list.is_empty() => list.clone(),
            _ => DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect(),
        };
        let current = self.form.category.trim();
        if !current.is_empty() && !options.iter().any(|c| c == current) {
            options.push(current.to_string());
        }
        options
    }

    #[must_use]
    pub const fn form_errors(&self) -> &ValidationErrors {
        &self.form_errors
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn tick(&mut self, now: Instant) {
        clear_expired(&mut self.notice, now);
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        InFlight::is_pending(&self.submitting)
    }

    /// Validate the form and reserve the submission slot.
    ///
    /// # Errors
    ///
    /// Returns `SessionEnded` once the session the editor was loaded for is
    /// gone, `Forbidden` for non-admin sessions, `SubmissionPending` while
    /// another save is outstanding, or `Invalid` when validation fails.
    pub fn prepare_submit(&mut self) -> Result<ProductSubmission, EditorError> {
        if !self.binding.is_current(&self.storefront) {
            info!("Session ended, discarding product form");
            self.discard();
            return Err(EditorError::SessionEnded);
        }
        if !self.storefront.snapshot().is_admin() {
            self.error = Some(UNAUTHORIZED_MESSAGE.to_string());
            return Err(EditorError::Forbidden);
        }
        let in_flight =
            InFlight::acquire(&self.submitting).ok_or(EditorError::SubmissionPending)?;

        let input = match self.form.validate() {
            Ok(input) => input,
            Err(errors) => {
                self.error = Some(match self.mode {
                    EditorMode::Create => errors.to_string(),
                    EditorMode::Modify(_) => "Please fill all required fields correctly".to_string(),
                });
                self.form_errors = errors.clone();
                return Err(EditorError::Invalid(errors));
            }
        };
        self.form_errors = ValidationErrors::new();
        self.error = None;

        Ok(ProductSubmission {
            input,
            _in_flight: in_flight,
        })
    }

    /// Apply the outcome of the save request.
    ///
    /// # Errors
    ///
    /// Returns `Request` with the message now shown on the view, or
    /// `SessionEnded` when the session ended while the request was out.
    pub fn complete_submit(
        &mut self,
        submission: ProductSubmission,
        result: Result<(), ApiError>,
    ) -> Result<Navigation, EditorError> {
        let name = submission.input.name.clone();
        drop(submission);
        if !self.binding.is_current(&self.storefront) {
            self.discard();
            return Err(EditorError::SessionEnded);
        }

        let (action, success) = match self.mode {
            EditorMode::Create => ("add product", format!("Product {name} added successfully")),
            EditorMode::Modify(_) => ("update product", "Product updated successfully".to_string()),
        };
        match result {
            Ok(()) => {
                info!(name = %name, action, "Product saved");
                self.notice = Some(Notice::success(success));
                Ok(Navigation::delayed(Route::Products))
            }
            Err(e) => {
                error!(name = %name, action, error = %e, "Failed to save product");
                let message = e.user_message(action);
                self.error = Some(message.clone());
                self.notice = Some(Notice::error(message.clone()));
                Err(EditorError::Request(message))
            }
        }
    }

    /// Validate and save the form.
    ///
    /// # Errors
    ///
    /// See [`Self::prepare_submit`] and [`Self::complete_submit`].
    pub async fn submit(&mut self) -> Result<Navigation, EditorError> {
        let submission = self.prepare_submit()?;

        let storefront = self.storefront.clone();
        let api = storefront.api();
        let body = &submission.input;
        let result = match &self.mode {
            EditorMode::Create => {
                storefront
                    .authorized()
                    .run(Privilege::Admin, |token| async move {
                        api.create_product(body, &token).await
                    })
                    .await
            }
            EditorMode::Modify(id) => {
                storefront
                    .authorized()
                    .run(Privilege::Admin, |token| async move {
                        api.update_product(id, body, &token).await
                    })
                    .await
            }
        };

        self.complete_submit(submission, result)
    }

    fn discard(&mut self) {
        self.form = ProductForm::default();
        self.form_errors = ValidationErrors::new();
        self.product = FetchState::Idle;
        self.categories = FetchState::Idle;
        self.error = Some(SESSION_ENDED_MESSAGE.to_string());
        self.notice = None;
    }
}
