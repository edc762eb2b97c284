//! Sale and purchase payloads, and their returns, as assembled on the device.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zahra_shared::types::{AccountId, CompanyId, CurrencyCode, PartyId, UserId};

use super::error::ValidationError;
use super::line_items::{LineItemInput, validate_line_items};

/// How a sale is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Paid in cash.
    Cash,
    /// Paid by card.
    Card,
    /// Paid by bank transfer.
    Transfer,
    /// Sold on credit.
    Credit,
}

impl PaymentMethod {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
            Self::Credit => "credit",
        }
    }
}

/// A sales invoice before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    /// Selling company.
    pub company_id: CompanyId,
    /// User recording the sale.
    pub user_id: UserId,
    /// Customer, absent for walk-in sales.
    #[serde(default)]
    pub party_id: Option<PartyId>,
    /// Invoice lines.
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    /// Settlement method, required.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Treasury account selected by the user, before currency routing.
    #[serde(default)]
    pub treasury_account_id: Option<AccountId>,
    /// Invoice currency, base currency when absent.
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    /// Snapshot rate, filled in at submission when absent.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A purchase invoice before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePayload {
    /// Buying company.
    pub company_id: CompanyId,
    /// User recording the purchase.
    pub user_id: UserId,
    /// Supplier.
    #[serde(default)]
    pub supplier_id: Option<PartyId>,
    /// Supplier's invoice number.
    #[serde(default)]
    pub invoice_number: Option<String>,
    /// Invoice date, required.
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// Invoice lines, priced by `costPrice`.
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    /// Treasury account selected by the user, before currency routing.
    #[serde(default)]
    pub treasury_account_id: Option<AccountId>,
    /// Invoice currency, base currency when absent.
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    /// Snapshot rate, filled in at submission when absent.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Invoice being returned against, returns only.
    #[serde(default)]
    pub reference_invoice_id: Option<String>,
    /// Why the goods go back, returns only.
    #[serde(default)]
    pub return_reason: Option<String>,
}

/// Validates a sale: line items plus a payment method.
#[must_use]
pub fn validate_sale_payload(payload: &SalePayload) -> Vec<ValidationError> {
    let mut errors = validate_line_items(&payload.items);

    if payload.payment_method.is_none() {
        errors.push(ValidationError::new(
            "paymentMethod",
            "Payment method is required",
        ));
    }

    errors
}

/// Validates a sale return. Returns settle against the original invoice,
/// so only the lines are checked.
#[must_use]
pub fn validate_sale_return_payload(payload: &SalePayload) -> Vec<ValidationError> {
    validate_line_items(&payload.items)
}

/// Validates a purchase: line items priced by cost plus an issue date.
#[must_use]
pub fn validate_purchase_payload(payload: &PurchasePayload) -> Vec<ValidationError> {
    let mut errors = validate_purchase_return_payload(payload);

    if payload.issue_date.is_none() {
        errors.push(ValidationError::new("issueDate", "Invoice date is required"));
    }

    errors
}

/// Validates a purchase return: line items priced by cost.
#[must_use]
pub fn validate_purchase_return_payload(payload: &PurchasePayload) -> Vec<ValidationError> {
    let items: Vec<LineItemInput> = payload
        .items
        .iter()
        .map(|item| LineItemInput {
            unit_price: item.cost_price,
            ..item.clone()
        })
        .collect();
    validate_line_items(&items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(price: Decimal) -> LineItemInput {
        LineItemInput {
            product_id: Some("p1".to_string()),
            quantity: Some(dec!(1)),
            unit_price: Some(price),
            cost_price: None,
        }
    }

    fn sale() -> SalePayload {
        SalePayload {
            company_id: CompanyId::new(),
            user_id: UserId::new(),
            party_id: None,
            items: vec![line(dec!(10))],
            payment_method: Some(PaymentMethod::Cash),
            treasury_account_id: None,
            currency: None,
            exchange_rate: None,
            notes: None,
        }
    }

    fn purchase() -> PurchasePayload {
        PurchasePayload {
            company_id: CompanyId::new(),
            user_id: UserId::new(),
            supplier_id: Some(PartyId::new()),
            invoice_number: Some("INV-7".to_string()),
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            items: vec![LineItemInput {
                product_id: Some("p1".to_string()),
                quantity: Some(dec!(4)),
                unit_price: None,
                cost_price: Some(dec!(2.5)),
            }],
            treasury_account_id: None,
            currency: None,
            exchange_rate: None,
            notes: None,
            reference_invoice_id: None,
            return_reason: None,
        }
    }

    #[test]
    fn test_valid_sale() {
        assert!(validate_sale_payload(&sale()).is_empty());
    }

    #[test]
    fn test_sale_requires_payment_method() {
        let payload = SalePayload {
            payment_method: None,
            ..sale()
        };
        let errors = validate_sale_payload(&payload);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "paymentMethod");
    }

    #[test]
    fn test_sale_combines_item_and_payload_errors() {
        let payload = SalePayload {
            items: Vec::new(),
            payment_method: None,
            ..sale()
        };
        let fields: Vec<_> = validate_sale_payload(&payload)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["items", "paymentMethod"]);
    }

    #[test]
    fn test_valid_purchase() {
        assert!(validate_purchase_payload(&purchase()).is_empty());
    }

    #[test]
    fn test_purchase_requires_issue_date() {
        let payload = PurchasePayload {
            issue_date: None,
            ..purchase()
        };
        let errors = validate_purchase_payload(&payload);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "issueDate");
    }

    #[test]
    fn test_purchase_prices_by_cost() {
        // A stale unit price must not hide a negative cost
        let mut payload = purchase();
        payload.items[0].unit_price = Some(dec!(100));
        payload.items[0].cost_price = Some(dec!(-1));

        let errors = validate_purchase_payload(&payload);
        assert_eq!(errors[0].field, "items[0].price");
    }

    #[test]
    fn test_sale_return_needs_no_payment_method() {
        let payload = SalePayload {
            payment_method: None,
            ..sale()
        };
        assert!(validate_sale_return_payload(&payload).is_empty());

        let empty = SalePayload {
            items: Vec::new(),
            ..payload
        };
        let errors = validate_sale_return_payload(&empty);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "items");
    }

    #[test]
    fn test_purchase_return_needs_no_issue_date() {
        let mut payload = PurchasePayload {
            issue_date: None,
            return_reason: Some("damaged".to_string()),
            ..purchase()
        };
        assert!(validate_purchase_return_payload(&payload).is_empty());

        payload.items[0].cost_price = Some(dec!(-1));
        let errors = validate_purchase_return_payload(&payload);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "items[0].price");
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(PaymentMethod::Transfer.as_str(), "transfer");
        let parsed: PaymentMethod = serde_json::from_str("\"credit\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Credit);
    }
}
