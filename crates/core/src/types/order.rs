//! Order intent, quantity and the order-creation payload.

use serde::{Deserialize, Serialize};

use super::id::{AddressId, OrderId, ProductId};

/// Errors raised when a requested quantity falls outside `1..=available`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("Quantity must be at least 1")]
    BelowMinimum,
    #[error("Quantity cannot exceed available stock ({available})")]
    ExceedsStock { available: u32 },
}

/// A number of units that was valid against stock when it was chosen.
///
/// The bound is only enforced client-side at selection time; the server
/// remains authoritative when the order is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Validate `requested` against the units currently available.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError`] if `requested < 1` or `requested > available`.
    pub fn new(requested: i64, available: u32) -> Result<Self, QuantityError> {
        if requested < 1 {
            return Err(QuantityError::BelowMinimum);
        }
        match u32::try_from(requested) {
            Ok(q) if q <= available => Ok(Self(q)),
            _ => Err(QuantityError::ExceedsStock { available }),
        }
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(QuantityError::BelowMinimum);
        }
        Ok(Self(value))
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

/// What the product page hands to checkout: which product, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub product: ProductId,
    pub quantity: Quantity,
    pub address: AddressId,
}

/// Order as returned by the server after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub product: Option<ProductId>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub address: Option<AddressId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(0, 5), Err(QuantityError::BelowMinimum));
        assert_eq!(Quantity::new(-2, 5), Err(QuantityError::BelowMinimum));
        assert_eq!(
            Quantity::new(6, 5),
            Err(QuantityError::ExceedsStock { available: 5 })
        );
        assert_eq!(Quantity::new(5, 5).unwrap().get(), 5);
        assert_eq!(Quantity::new(1, 5).unwrap().get(), 1);
    }

    #[test]
    fn test_quantity_out_of_stock() {
        assert_eq!(
            Quantity::new(1, 0),
            Err(QuantityError::ExceedsStock { available: 0 })
        );
    }

    #[test]
    fn test_quantity_huge_request() {
        assert_eq!(
            Quantity::new(i64::MAX, u32::MAX),
            Err(QuantityError::ExceedsStock { available: u32::MAX })
        );
    }

    #[test]
    fn test_new_order_wire_shape() {
        let order = NewOrder {
            product: ProductId::new("p1"),
            quantity: Quantity::new(3, 5).unwrap(),
            address: AddressId::new("a1"),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"product": "p1", "quantity": 3, "address": "a1"})
        );
    }

    #[test]
    fn test_zero_quantity_rejected_on_deserialize() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }
}
