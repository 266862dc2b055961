//! Single product page: quantity selection and the start of checkout.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error};

use eshop_core::{OrderIntent, Privilege, Product, ProductId, Quantity, QuantityError};

use super::{FetchState, Navigation};
use crate::routes::Route;
use crate::state::Storefront;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailError {
    #[error("Product details are not loaded")]
    NotLoaded,

    #[error("This product is currently out of stock.")]
    OutOfStock,

    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

/// State of the product detail screen.
pub struct ProductDetailView {
    storefront: Storefront,
    id: ProductId,
    product: FetchState<Product>,
    categories: FetchState<Vec<String>>,
    quantity: u32,
}

impl ProductDetailView {
    #[must_use]
    pub const fn new(storefront: Storefront, id: ProductId) -> Self {
        Self {
            storefront,
            id,
            product: FetchState::Idle,
            categories: FetchState::Idle,
            quantity: 1,
        }
    }

    /// Fetch the product and the category bar concurrently.
    pub async fn load(&mut self) {
        self.product = FetchState::Loading;
        self.categories = FetchState::Loading;

        let storefront = self.storefront.clone();
        let api = storefront.api();
        let id = &self.id;
        let (product, categories) = tokio::join!(
            storefront
                .authorized()
                .run(Privilege::User, |token| async move {
                    api.get_product(id, &token).await
                }),
            api.list_categories(),
        );

        self.product = FetchState::from_result(product, |e| {
            error!(product_id = %self.id, error = %e, "Failed to fetch product details");
            e.server_message()
                .unwrap_or("Failed to load product details. Please try again later.")
                .to_string()
        });
        self.categories = FetchState::from_result(categories, |e| {
            error!(error = %e, "Failed to fetch categories");
            "Could not load categories.".to_string()
        });
        self.quantity = 1;
    }

    #[must_use]
    pub const fn product(&self) -> &FetchState<Product> {
        &self.product
    }

    #[must_use]
    pub const fn categories(&self) -> &FetchState<Vec<String>> {
        &self.categories
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Change the selected quantity.
    ///
    /// # Errors
    ///
    /// Rejects values below 1 or above the available stock; the previous
    /// quantity is kept.
    pub fn set_quantity(&mut self, requested: i64) -> Result<Quantity, DetailError> {
        let product = self.product.loaded().ok_or(DetailError::NotLoaded)?;
        let quantity = Quantity::new(requested, product.available_items).inspect_err(|_| {
            debug!(requested, available = product.available_items, "Quantity rejected");
        })?;
        self.quantity = quantity.get();
        Ok(quantity)
    }

    /// Price times the selected quantity.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        let product = self.product.loaded()?;
        let quantity = Quantity::new(i64::from(self.quantity), product.available_items).ok()?;
        Some(product.price.times(quantity))
    }

    /// Begin checkout with the selected quantity.
    ///
    /// # Errors
    ///
    /// Refuses when the product is not loaded or is out of stock.
    pub fn place_order(&self) -> Result<(OrderIntent, Navigation), DetailError> {
        let product = self.product.loaded().ok_or(DetailError::NotLoaded)?;
        if !product.in_stock() {
            return Err(DetailError::OutOfStock);
        }
        let quantity = Quantity::new(i64::from(self.quantity), product.available_items)?;
        let intent = OrderIntent {
            product_id: product.id.clone(),
            quantity,
        };
        Ok((intent, Navigation::now(Route::CreateOrder)))
    }
}
