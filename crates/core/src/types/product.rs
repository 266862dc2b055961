//! Product records as served by `/products`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Price;

/// A product listed in the catalog.
///
/// Some deployments of the API name the display field `title` and the id
/// `_id`; both spellings are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    #[serde(alias = "title", default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub available_items: u32,
    pub price: Price,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Display name, falling back when the server sent none.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unnamed Product"
        } else {
            &self.name
        }
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.available_items > 0
    }

    /// Case-insensitive substring match against name and description.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches_keyword(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// The editable fields of this product, e.g. to prefill a modify form.
    #[must_use]
    pub fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            category: self.category.clone(),
            manufacturer: self.manufacturer.clone(),
            available_items: self.available_items,
            price: self.price,
            image_url: self.image_url.clone(),
            description: self.description.clone(),
        }
    }
}

/// Body of `POST /products` and `PUT /products/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub category: String,
    pub manufacturer: String,
    pub available_items: u32,
    pub price: Price,
    pub image_url: String,
    pub description: String,
}
