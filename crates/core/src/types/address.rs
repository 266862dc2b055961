//! Delivery addresses.

use serde::{Deserialize, Serialize};

use super::contact::{ContactNumber, Zipcode};
use super::id::AddressId;

/// A saved delivery address as returned by `/addresses`.
///
/// Server data is not re-validated; the digit rules apply to what the user
/// types, see [`NewAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(alias = "_id")]
    pub id: AddressId,
    pub name: String,
    pub contact_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

impl Address {
    /// One-line label used in address pickers: `name - street, city`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}, {}", self.name, self.street, self.city)
    }
}

/// Body of `POST /addresses`, built only from a validated form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub name: String,
    pub contact_number: ContactNumber,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: Zipcode,
    /// Sent as an empty string when the user left it blank.
    pub landmark: String,
}
