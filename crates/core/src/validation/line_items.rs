//! Invoice line item validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// A line item as entered, before any field is known to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    /// Product sold or bought.
    #[serde(default)]
    pub product_id: Option<String>,
    /// Quantity, must be positive.
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Sale price per unit.
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Purchase cost per unit, used when `unit_price` is absent.
    #[serde(default)]
    pub cost_price: Option<Decimal>,
}

impl LineItemInput {
    /// Effective price: `unit_price`, else `cost_price`, else 0.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.unit_price.or(self.cost_price).unwrap_or(Decimal::ZERO)
    }

    /// Quantity × price, 0 when the quantity is missing.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ZERO) * self.price()
    }
}

/// Validates invoice line items.
///
/// An empty list yields exactly one error on `items`. Otherwise each item is
/// checked for a product, a positive quantity, and a non-negative price.
#[must_use]
pub fn validate_line_items(items: &[LineItemInput]) -> Vec<ValidationError> {
    if items.is_empty() {
        return vec![ValidationError::new(
            "items",
            "At least one item is required",
        )];
    }

    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let line = index + 1;

        if item.product_id.as_deref().is_none_or(str::is_empty) {
            errors.push(ValidationError::new(
                format!("items[{index}].productId"),
                format!("Item {line}: a product must be selected"),
            ));
        }

        if item.quantity.is_none_or(|q| q <= Decimal::ZERO) {
            errors.push(ValidationError::new(
                format!("items[{index}].quantity"),
                format!("Item {line}: quantity must be greater than zero"),
            ));
        }

        if item.price() < Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("items[{index}].price"),
                format!("Item {line}: price cannot be negative"),
            ));
        }
    }

    errors
}
