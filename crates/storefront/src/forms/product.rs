use std::str::FromStr;

use rust_decimal::Decimal;

use eshop_core::{Price, PriceError, Product, ProductInput};

use super::{ValidationErrors, required};

const AVAILABLE_ITEMS_ERROR: &str = "Available items must be 0 or greater";

/// Add/modify product form. Numeric fields hold raw text until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub category: String,
    pub manufacturer: String,
    pub available_items: String,
    pub price: String,
    pub image_url: String,
    pub description: String,
}

impl ProductForm {
    /// Prefill from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.clone(),
            manufacturer: product.manufacturer.clone(),
            available_items: product.available_items.to_string(),
            price: product.price.amount().to_string(),
            image_url: product.image_url.clone(),
            description: product.description.clone(),
        }
    }

    /// Validate and build the create/update body.
    ///
    /// # Errors
    ///
    /// Returns field errors for a missing name, category or manufacturer, an
    /// available-items count that is not a non-negative integer, or a price
    /// that is not a non-negative number.
    pub fn validate(&self) -> Result<ProductInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required(&mut errors, "name", "Name", &self.name);
        let category = required(&mut errors, "category", "Category", &self.category);
        let manufacturer = required(&mut errors, "manufacturer", "Manufacturer", &self.manufacturer);

        let available_items = self
            .available_items
            .trim()
            .parse::<u32>()
            .map_err(|_| errors.add("availableItems", AVAILABLE_ITEMS_ERROR))
            .ok();

        let price = Decimal::from_str(self.price.trim())
            .ok()
            .and_then(|amount| Price::new(amount).ok());
        if price.is_none() {
            errors.add("price", PriceError::Negative.to_string());
        }

        match (available_items, price) {
            (Some(available_items), Some(price)) if errors.is_empty() => Ok(ProductInput {
                name: name.to_string(),
                category: category.to_string(),
                manufacturer: manufacturer.to_string(),
                available_items,
                price,
                image_url: self.image_url.trim().to_string(),
                description: self.description.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}
