//! Receipt and payment vouchers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zahra_shared::types::{AccountId, CompanyId, CurrencyCode, UserId};

use super::error::ValidationError;
use super::payload::PaymentMethod;

/// Direction of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondType {
    /// Money received.
    Receipt,
    /// Money paid out.
    Payment,
}

impl BondType {
    /// Returns the payment type the remote procedure records.
    #[must_use]
    pub fn payment_type(self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Payment => "disbursement",
        }
    }
}

/// What the other side of a voucher is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterpartyType {
    /// A customer or supplier.
    #[default]
    Party,
    /// A ledger account.
    Account,
}

impl CounterpartyType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Party => "party",
            Self::Account => "account",
        }
    }
}

/// A receipt or payment voucher before submission.
///
/// `amount` is in the voucher currency. The base amount is derived from
/// the frozen rate at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Company the voucher belongs to.
    pub company_id: CompanyId,
    /// User recording the voucher.
    pub user_id: UserId,
    /// Receipt or payment.
    #[serde(rename = "type")]
    pub bond_type: BondType,
    /// Amount in the voucher currency, must be positive.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Voucher date, required.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Cash or bank account the money moves through, required.
    #[serde(default)]
    pub cash_account_id: Option<AccountId>,
    /// Kind of counterparty.
    #[serde(default)]
    pub counterparty_type: CounterpartyType,
    /// Party or account on the other side, required.
    #[serde(default)]
    pub counterparty_id: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Settlement method, cash when absent.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// External reference, e.g. a cheque number.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Voucher currency, base currency when absent.
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    /// Snapshot rate, filled in at submission when absent.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
}

/// Validates a voucher: a positive amount, a date, and both accounts.
#[must_use]
pub fn validate_payment_payload(payload: &PaymentPayload) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if payload.amount.is_none_or(|a| a <= Decimal::ZERO) {
        errors.push(ValidationError::new(
            "amount",
            "Amount must be greater than zero",
        ));
    }
    if payload.date.is_none() {
        errors.push(ValidationError::new("date", "Date is required"));
    }
    if payload.cash_account_id.is_none() {
        errors.push(ValidationError::new(
            "cashAccountId",
            "A cash or bank account must be selected",
        ));
    }
    if payload.counterparty_id.as_deref().is_none_or(str::is_empty) {
        errors.push(ValidationError::new(
            "counterpartyId",
            "A counterparty must be selected",
        ));
    }

    errors
}
