//! Base-currency totals over heterogeneous-currency records.
//!
//! Invoices, expenses, and bonds all carry an amount, a currency, and the rate
//! snapshotted when they were created. Reading them through one record shape
//! lets any list or dashboard sum them into a single base-currency figure.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use zahra_shared::types::{CurrencyCode, ExchangeOperator};

use super::conversion::convert_to_base;

/// The monetary fields of any financial record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MonetaryRecord {
    /// Amount in the record's currency.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub amount: Option<Decimal>,
    /// Fallback when `amount` is absent (invoices use `total_amount`).
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_amount: Option<Decimal>,
    /// Record currency, base currency when absent.
    #[serde(default)]
    pub currency_code: Option<CurrencyCode>,
    /// Snapshotted rate, 1 when absent.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub exchange_rate: Option<Decimal>,
    /// Operator the rate was captured with.
    #[serde(default)]
    pub exchange_operator: Option<ExchangeOperator>,
}

impl MonetaryRecord {
    /// Creates a record for `amount` in `currency_code` at `exchange_rate`.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: CurrencyCode, exchange_rate: Decimal) -> Self {
        Self {
            amount: Some(amount),
            total_amount: None,
            currency_code: Some(currency_code),
            exchange_rate: Some(exchange_rate),
            exchange_operator: None,
        }
    }
}

/// Returns the record's amount expressed in the base currency.
///
/// Always applies the recorded rate, whatever the currency says. Base records
/// carry rate 1, which converts as identity.
#[must_use]
pub fn to_base_currency(record: &MonetaryRecord) -> Decimal {
    let amount = record
        .amount
        .or(record.total_amount)
        .unwrap_or(Decimal::ZERO);

    convert_to_base(
        amount,
        record.exchange_rate.unwrap_or(Decimal::ONE),
        record.exchange_operator.unwrap_or_default(),
    )
}

/// Sums a collection of records in the base currency.
#[must_use]
pub fn sum_in_base_currency<'a>(records: impl IntoIterator<Item = &'a MonetaryRecord>) -> Decimal {
    records.into_iter().map(to_base_currency).sum()
}

/// Accepts numbers and numeric strings; anything else reads as absent.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(Decimal),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(value)) => Some(value),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}
