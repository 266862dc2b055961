//! Multi-step checkout for a single product.
//!
//! ```text
//! ReviewProduct ──next──▶ SelectAddress ──next──▶ Confirm ──next──▶ Placed
//!       ▲                      │   ▲                 │
//!       └────────back──────────┘   └──────back───────┘
//! ```
//!
//! `back` from `ReviewProduct` leaves the workflow for the product page.
//! Saved addresses are fetched on entering `SelectAddress`, never earlier.
//! Placing the order is a real request; on failure the workflow stays in
//! `Confirm`. The draft lives only in memory and is gone once the workflow
//! is dropped, or as soon as the workflow notices that the session it was
//! started in has ended.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info};

use eshop_core::{
    Address, AddressId, NewAddress, NewOrder, Order, OrderIntent, Price, Privilege, Product,
    ProductId, Quantity,
};

use super::{
    FetchState, InFlight, Navigation, Notice, SESSION_ENDED_MESSAGE, SessionBinding,
    clear_expired,
};
use crate::api::ApiError;
use crate::error::add_breadcrumb;
use crate::forms::{AddressForm, ValidationErrors};
use crate::routes::Route;
use crate::state::Storefront;

const BREADCRUMB_CATEGORY: &str = "checkout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    ReviewProduct,
    SelectAddress,
    Confirm,
    Placed,
}

impl CheckoutStep {
    /// Steps shown in the progress indicator.
    pub const STEPPER: [Self; 3] = [Self::ReviewProduct, Self::SelectAddress, Self::Confirm];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReviewProduct => "Items",
            Self::SelectAddress => "Select Address",
            Self::Confirm | Self::Placed => "Confirm Order",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::ReviewProduct => "ReviewProduct",
            Self::SelectAddress => "SelectAddress",
            Self::Confirm => "Confirm",
            Self::Placed => "Placed",
        }
    }
}

/// Why a checkout action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("No product selected. Please go back to the products page.")]
    NoProductSelected,

    #[error("Product details are not available yet")]
    ProductNotReady,

    #[error("Saved addresses are still loading")]
    AddressesLoading,

    #[error("Please select an address to continue")]
    AddressNotSelected,

    #[error("Unknown address {0}")]
    UnknownAddress(AddressId),

    #[error("Please fill all required fields correctly")]
    InvalidAddress(ValidationErrors),

    #[error("Product details not found.")]
    ProductMissing,

    #[error("Please select a delivery address.")]
    DeliveryAddressMissing,

    #[error("A submission is already in progress")]
    SubmissionPending,

    #[error("Not available in step {0:?}")]
    WrongStep(CheckoutStep),

    #[error("The order has already been placed")]
    AlreadyPlaced,

    /// The user logged out (or in again) since the checkout started.
    #[error("{}", SESSION_ENDED_MESSAGE)]
    SessionEnded,

    /// A request failed; carries the message shown to the user.
    #[error("{0}")]
    Request(String),
}

impl WorkflowError {
    /// Where to go instead of continuing the checkout, if anywhere.
    #[must_use]
    pub const fn redirect(&self) -> Option<Navigation> {
        match self {
            Self::SessionEnded => Some(Navigation::now(Route::Login)),
            _ => None,
        }
    }
}

/// The ephemeral order being assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub selected_address_id: Option<AddressId>,
}

/// What the `ReviewProduct` step shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review<'a> {
    pub product: &'a Product,
    pub quantity: Quantity,
    pub total: Decimal,
    pub warnings: Vec<String>,
}

/// What the `Confirm` step shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation<'a> {
    pub product: &'a Product,
    pub quantity: Quantity,
    pub address: &'a Address,
    pub total: Decimal,
}

impl Confirmation<'_> {
    #[must_use]
    pub fn formatted_total(&self) -> String {
        Price::format_amount(self.total)
    }
}

/// Which controls are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutAffordances {
    pub back_enabled: bool,
    pub next_enabled: bool,
    pub next_label: &'static str,
    pub save_address_enabled: bool,
}

/// A validated address waiting for its creation request.
///
/// While this value exists no other address can be submitted.
#[derive(Debug)]
pub struct AddressSubmission {
    pub address: NewAddress,
    _in_flight: InFlight,
}

/// An order waiting for its creation request.
///
/// While this value exists the order cannot be placed again.
#[derive(Debug)]
pub struct OrderSubmission {
    pub order: NewOrder,
    _in_flight: InFlight,
}

// =============================================================================
// CheckoutWorkflow
// =============================================================================

pub struct CheckoutWorkflow {
    storefront: Storefront,
    binding: SessionBinding,
    draft: Option<OrderDraft>,
    step: CheckoutStep,
    product: FetchState<Product>,
    addresses: FetchState<Vec<Address>>,
    address_form: AddressForm,
    address_form_errors: ValidationErrors,
    address_error: Option<String>,
    order_error: Option<String>,
    saving_address: Arc<AtomicBool>,
    placing_order: Arc<AtomicBool>,
    order: Option<Order>,
    notice: Option<Notice>,
}

impl CheckoutWorkflow {
    /// Start a checkout for `intent`. Without an intent the workflow is a
    /// terminal error.
    #[must_use]
    pub fn new(storefront: Storefront, intent: Option<OrderIntent>) -> Self {
        let product = if intent.is_some() {
            FetchState::Idle
        } else {
            FetchState::Failed(WorkflowError::NoProductSelected.to_string())
        };
        let draft = intent.map(|intent| OrderDraft {
            product_id: intent.product_id,
            quantity: intent.quantity,
            selected_address_id: None,
        });

        Self {
            binding: SessionBinding::bind(&storefront),
            storefront,
            draft,
            step: CheckoutStep::ReviewProduct,
            product,
            addresses: FetchState::Idle,
            address_form: AddressForm::default(),
            address_form_errors: ValidationErrors::new(),
            address_error: None,
            order_error: None,
            saving_address: Arc::new(AtomicBool::new(false)),
            placing_order: Arc::new(AtomicBool::new(false)),
            order: None,
            notice: None,
        }
    }

    /// Enter `ReviewProduct`: fetch the product being ordered.
    pub async fn start(&mut self) {
        if self.ensure_session().is_err() {
            return;
        }
        let Some(draft) = &self.draft else {
            return;
        };
        let product_id = draft.product_id.clone();
        self.record_transition(CheckoutStep::ReviewProduct);
        self.product = FetchState::Loading;

        let storefront = self.storefront.clone();
        let api = storefront.api();
        let id = &product_id;
        let result = storefront
            .authorized()
            .run(Privilege::User, |token| async move {
                api.get_product(id, &token).await
            })
            .await;

        self.product = FetchState::from_result(result, |e| {
            error!(product_id = %product_id, error = %e, "Failed to load product for checkout");
            e.server_message()
                .unwrap_or("Failed to load product details.")
                .to_string()
        });
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Move forward one step.
    ///
    /// From `Confirm` this places the order and, on success, returns the
    /// delayed navigation back to the catalog.
    ///
    /// # Errors
    ///
    /// Returns why the step did not advance. The workflow state is unchanged
    /// except for the error message shown to the user.
    pub async fn next(&mut self) -> Result<Option<Navigation>, WorkflowError> {
        self.ensure_session()?;
        match self.step {
            CheckoutStep::ReviewProduct => {
                if self.draft.is_none() {
                    return Err(WorkflowError::NoProductSelected);
                }
                if self.product.loaded().is_none() {
                    return Err(WorkflowError::ProductNotReady);
                }
                self.address_error = None;
                self.enter(CheckoutStep::SelectAddress);
                self.fetch_addresses().await;
                Ok(None)
            }
            CheckoutStep::SelectAddress => {
                self.address_error = None;
                if self.addresses.is_loading() {
                    return Err(WorkflowError::AddressesLoading);
                }
                if self.selected_address_id().is_none_or(AddressId::is_empty) {
                    let err = WorkflowError::AddressNotSelected;
                    self.address_error = Some(err.to_string());
                    return Err(err);
                }
                self.enter(CheckoutStep::Confirm);
                Ok(None)
            }
            CheckoutStep::Confirm => self.place_order().await.map(Some),
            CheckoutStep::Placed => Err(WorkflowError::AlreadyPlaced),
        }
    }

    /// Move back one step.
    ///
    /// From `ReviewProduct` this leaves the workflow and returns the product
    /// page to navigate to.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::AlreadyPlaced` once the order was placed,
    /// `SubmissionPending` while it is being placed and `SessionEnded` once
    /// the session is gone.
    pub async fn back(&mut self) -> Result<Option<Navigation>, WorkflowError> {
        self.ensure_session()?;
        if InFlight::is_pending(&self.placing_order) {
            return Err(WorkflowError::SubmissionPending);
        }
        match self.step {
            CheckoutStep::ReviewProduct => {
                let to = self.draft.as_ref().map_or(Route::Products, |draft| {
                    Route::ProductDetail(draft.product_id.clone())
                });
                Ok(Some(Navigation::now(to)))
            }
            CheckoutStep::SelectAddress => {
                self.address_error = None;
                self.enter(CheckoutStep::ReviewProduct);
                Ok(None)
            }
            CheckoutStep::Confirm => {
                self.address_error = None;
                self.order_error = None;
                self.enter(CheckoutStep::SelectAddress);
                self.fetch_addresses().await;
                Ok(None)
            }
            CheckoutStep::Placed => Err(WorkflowError::AlreadyPlaced),
        }
    }

    /// Choose a saved address.
    ///
    /// # Errors
    ///
    /// Refused outside `SelectAddress` or for an id not in the list.
    pub fn select_address(&mut self, id: AddressId) -> Result<(), WorkflowError> {
        self.ensure_session()?;
        if self.step != CheckoutStep::SelectAddress {
            return Err(WorkflowError::WrongStep(self.step));
        }
        let known = self
            .addresses
            .loaded()
            .is_some_and(|list| list.iter().any(|a| a.id == id));
        if !known {
            return Err(WorkflowError::UnknownAddress(id));
        }
        debug!(address_id = %id, "Address selected");
        if let Some(draft) = &mut self.draft {
            draft.selected_address_id = Some(id);
        }
        self.address_error = None;
        Ok(())
    }

    // =========================================================================
    // New address
    // =========================================================================

    pub const fn address_form_mut(&mut self) -> &mut AddressForm {
        &mut self.address_form
    }

    /// Validate the new-address form and reserve the submission slot.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAddress` (with field errors also kept on the view)
    /// without touching the network, or `SubmissionPending` while another
    /// address is being saved.
    pub fn prepare_address(&mut self) -> Result<AddressSubmission, WorkflowError> {
        self.ensure_session()?;
        if self.step != CheckoutStep::SelectAddress {
            return Err(WorkflowError::WrongStep(self.step));
        }
        let in_flight =
            InFlight::acquire(&self.saving_address).ok_or(WorkflowError::SubmissionPending)?;

        match self.address_form.validate() {
            Ok(address) => {
                self.address_form_errors = ValidationErrors::new();
                self.address_error = None;
                Ok(AddressSubmission {
                    address,
                    _in_flight: in_flight,
                })
            }
            Err(errors) => {
                debug!(fields = errors.len(), "Address form rejected");
                let err = WorkflowError::InvalidAddress(errors.clone());
                self.address_form_errors = errors;
                self.address_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Apply the outcome of an address creation request.
    ///
    /// On success the address is appended, selected and the form cleared.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Request` with the message now shown on the view.
    pub fn complete_address(
        &mut self,
        submission: AddressSubmission,
        result: Result<Address, ApiError>,
    ) -> Result<AddressId, WorkflowError> {
        drop(submission);
        self.ensure_session()?;
        match result {
            Ok(address) => {
                let id = address.id.clone();
                info!(address_id = %id, "Address saved");
                add_breadcrumb(BREADCRUMB_CATEGORY, "Saved new address", &[("address_id", id.as_str())]);

                match &mut self.addresses {
                    FetchState::Loaded(list) => list.push(address),
                    other => *other = FetchState::Loaded(vec![address]),
                }
                if let Some(draft) = &mut self.draft {
                    draft.selected_address_id = Some(id.clone());
                }
                self.address_form = AddressForm::default();
                self.address_form_errors = ValidationErrors::new();
                self.address_error = None;
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, "Failed to save address");
                let message = e
                    .server_message()
                    .unwrap_or("Failed to save address.")
                    .to_string();
                self.address_error = Some(message.clone());
                Err(WorkflowError::Request(message))
            }
        }
    }

    /// Validate, save and select the address in the form.
    ///
    /// # Errors
    ///
    /// See [`Self::prepare_address`] and [`Self::complete_address`].
    pub async fn submit_address(&mut self) -> Result<AddressId, WorkflowError> {
        let submission = self.prepare_address()?;

        let storefront = self.storefront.clone();
        let api = storefront.api();
        let address = &submission.address;
        let result = storefront
            .authorized()
            .run(Privilege::User, |token| async move {
                api.create_address(address, &token).await
            })
            .await;

        self.complete_address(submission, result)
    }

    // =========================================================================
    // Placing the order
    // =========================================================================

    /// Build the order from the `Confirm` step and reserve the submission slot.
    ///
    /// # Errors
    ///
    /// Refused outside `Confirm`, when the product or address cannot be
    /// resolved, or with `SubmissionPending` while the order is being placed.
    pub fn prepare_order(&mut self) -> Result<OrderSubmission, WorkflowError> {
        self.ensure_session()?;
        match self.step {
            CheckoutStep::Confirm => {}
            CheckoutStep::Placed => return Err(WorkflowError::AlreadyPlaced),
            step => return Err(WorkflowError::WrongStep(step)),
        }
        let order = {
            let confirmation = self.confirmation()?;
            NewOrder {
                product: confirmation.product.id.clone(),
                quantity: confirmation.quantity,
                address: confirmation.address.id.clone(),
            }
        };
        let in_flight =
            InFlight::acquire(&self.placing_order).ok_or(WorkflowError::SubmissionPending)?;
        self.order_error = None;

        Ok(OrderSubmission {
            order,
            _in_flight: in_flight,
        })
    }

    /// Apply the outcome of the order creation request.
    ///
    /// On success the workflow moves to `Placed` and returns the delayed
    /// navigation back to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Request` with the message now shown on the
    /// view; the workflow stays in `Confirm`.
    pub fn complete_order(
        &mut self,
        submission: OrderSubmission,
        result: Result<Order, ApiError>,
    ) -> Result<Navigation, WorkflowError> {
        let product_id = submission.order.product.clone();
        drop(submission);
        if let Err(e) = self.ensure_session() {
            if let Ok(placed) = &result {
                info!(order_id = %placed.id, product_id = %product_id, "Order placed after the session ended");
            }
            return Err(e);
        }

        match result {
            Ok(placed) => {
                info!(order_id = %placed.id, product_id = %product_id, "Order placed");
                self.order = Some(placed);
                self.notice = Some(Notice::success("Order placed successfully"));
                self.enter(CheckoutStep::Placed);
                Ok(Navigation::delayed(Route::Products))
            }
            Err(e) => {
                error!(product_id = %product_id, error = %e, "Failed to place order");
                let message = e.user_message("place order");
                self.order_error = Some(message.clone());
                self.notice = Some(Notice::error(message.clone()));
                Err(WorkflowError::Request(message))
            }
        }
    }

    // =========================================================================
    // Views of the current state
    // =========================================================================

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn draft(&self) -> Option<&OrderDraft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub const fn product(&self) -> &FetchState<Product> {
        &self.product
    }

    #[must_use]
    pub const fn addresses(&self) -> &FetchState<Vec<Address>> {
        &self.addresses
    }

    #[must_use]
    pub fn selected_address_id(&self) -> Option<&AddressId> {
        self.draft.as_ref()?.selected_address_id.as_ref()
    }

    #[must_use]
    pub const fn address_form(&self) -> &AddressForm {
        &self.address_form
    }

    #[must_use]
    pub const fn address_form_errors(&self) -> &ValidationErrors {
        &self.address_form_errors
    }

    #[must_use]
    pub fn address_error(&self) -> Option<&str> {
        self.address_error.as_deref()
    }

    #[must_use]
    pub fn order_error(&self) -> Option<&str> {
        self.order_error.as_deref()
    }

    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn tick(&mut self, now: Instant) {
        clear_expired(&mut self.notice, now);
    }

    #[must_use]
    pub fn is_saving_address(&self) -> bool {
        InFlight::is_pending(&self.saving_address)
    }

    #[must_use]
    pub fn is_placing_order(&self) -> bool {
        InFlight::is_pending(&self.placing_order)
    }

    /// Price times quantity, once the product is loaded.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        let product = self.product.loaded()?;
        let draft = self.draft.as_ref()?;
        Some(product.price.times(draft.quantity))
    }

    /// Product summary with stock warnings.
    #[must_use]
    pub fn review(&self) -> Option<Review<'_>> {
        let product = self.product.loaded()?;
        let quantity = self.draft.as_ref()?.quantity;

        let mut warnings = Vec::new();
        if product.available_items < quantity.get() {
            warnings.push(format!(
                "Requested quantity exceeds stock ({}). Order may fail.",
                product.available_items
            ));
        }
        if !product.in_stock() {
            warnings.push("Product is Out of Stock".to_string());
        }

        Some(Review {
            product,
            quantity,
            total: product.price.times(quantity),
            warnings,
        })
    }

    /// Everything the `Confirm` step needs.
    ///
    /// # Errors
    ///
    /// Returns a blocking error directing the user back when the product or
    /// the selected address cannot be resolved.
    pub fn confirmation(&self) -> Result<Confirmation<'_>, WorkflowError> {
        let draft = self.draft.as_ref().ok_or(WorkflowError::NoProductSelected)?;
        let product = self.product.loaded().ok_or(WorkflowError::ProductMissing)?;
        let address = draft
            .selected_address_id
            .as_ref()
            .and_then(|id| {
                self.addresses
                    .loaded()
                    .and_then(|list| list.iter().find(|a| a.id == *id))
            })
            .ok_or(WorkflowError::DeliveryAddressMissing)?;

        Ok(Confirmation {
            product,
            quantity: draft.quantity,
            address,
            total: product.price.times(draft.quantity),
        })
    }

    #[must_use]
    pub fn affordances(&self) -> CheckoutAffordances {
        let placing = self.is_placing_order();
        let placed = self.step == CheckoutStep::Placed;

        let next_enabled = !placing
            && match self.step {
                CheckoutStep::ReviewProduct => self.product.loaded().is_some(),
                CheckoutStep::SelectAddress => {
                    let has_choices = self.addresses.loaded().is_some_and(|l| !l.is_empty());
                    !self.addresses.is_loading()
                        && !(has_choices && self.selected_address_id().is_none())
                }
                CheckoutStep::Confirm => true,
                CheckoutStep::Placed => false,
            };

        CheckoutAffordances {
            back_enabled: !placing && !placed,
            next_enabled,
            next_label: if matches!(self.step, CheckoutStep::Confirm | CheckoutStep::Placed) {
                "Place Order"
            } else {
                "Next"
            },
            save_address_enabled: self.step == CheckoutStep::SelectAddress
                && !self.is_saving_address(),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn enter(&mut self, step: CheckoutStep) {
        self.step = step;
        self.record_transition(step);
    }

    fn record_transition(&self, step: CheckoutStep) {
        let message = format!("Entered {}", step.name());
        debug!(step = step.name(), "Checkout transition");
        match &self.draft {
            Some(draft) => add_breadcrumb(
                BREADCRUMB_CATEGORY,
                &message,
                &[("product_id", draft.product_id.as_str())],
            ),
            None => add_breadcrumb(BREADCRUMB_CATEGORY, &message, &[]),
        }
    }

    /// Load saved addresses, keeping the selection if it is still listed.
    async fn fetch_addresses(&mut self) {
        self.addresses = FetchState::Loading;

        let storefront = self.storefront.clone();
        let api = storefront.api();
        let result = storefront
            .authorized()
            .run(Privilege::User, |token| async move {
                api.list_addresses(&token).await
            })
            .await;

        self.addresses = FetchState::from_result(result, |e| {
            error!(error = %e, "Failed to load addresses");
            e.server_message()
                .unwrap_or("Failed to load addresses")
                .to_string()
        });
        if let Some(message) = self.addresses.error() {
            self.address_error = Some(message.to_string());
        }

        let addresses = &self.addresses;
        if let Some(draft) = &mut self.draft {
            let still_listed = draft.selected_address_id.as_ref().is_some_and(|id| {
                addresses
                    .loaded()
                    .is_some_and(|list| list.iter().any(|a| a.id == *id))
            });
            if !still_listed {
                draft.selected_address_id = None;
            }
        }
    }

    /// Drop everything loaded for a session that has since ended.
    fn ensure_session(&mut self) -> Result<(), WorkflowError> {
        if self.binding.is_current(&self.storefront) {
            return Ok(());
        }
        if self.draft.is_some() {
            info!("Session ended, discarding checkout");
        }
        self.draft = None;
        self.product = FetchState::Failed(SESSION_ENDED_MESSAGE.to_string());
        self.addresses = FetchState::Idle;
        self.address_form = AddressForm::default();
        self.address_form_errors = ValidationErrors::new();
        self.address_error = None;
        self.order_error = None;
        self.order = None;
        self.notice = None;
        Err(WorkflowError::SessionEnded)
    }

    async fn place_order(&mut self) -> Result<Navigation, WorkflowError> {
        let submission = self.prepare_order()?;

        let storefront = self.storefront.clone();
        let api = storefront.api();
        let body = &submission.order;
        let result = storefront
            .authorized()
            .run(Privilege::User, |token| async move {
                api.create_order(body, &token).await
            })
            .await;

        self.complete_order(submission, result)
    }
}
