//! Type-safe price representation using decimal arithmetic.
//!
//! The REST API exchanges prices as JSON numbers. Internally they are held as
//! [`Decimal`] so order totals never pick up binary floating point error.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::order::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price must be 0 or greater")]
    Negative,
    #[error("price is not representable as a JSON number")]
    NotRepresentable,
}

/// A non-negative unit price in the store currency (INR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Currency symbol used when rendering amounts.
    pub const SYMBOL: &'static str = "₹";

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units, rounded to two decimal places.
    #[must_use]
    pub fn times(&self, quantity: Quantity) -> Decimal {
        (self.0 * Decimal::from(quantity.get())).round_dp(2)
    }

    /// Format an arbitrary amount the way prices are displayed (`₹ 300.00`).
    #[must_use]
    pub fn format_amount(amount: Decimal) -> String {
        format!("{} {:.2}", Self::SYMBOL, amount.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::format_amount(self.0))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .0
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom(PriceError::NotRepresentable))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Decimal accepts JSON numbers and numeric strings alike
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}
