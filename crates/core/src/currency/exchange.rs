//! Exchange rate snapshots and the rate book.
//!
//! A snapshot is immutable once recorded. Historical transactions are
//! re-derived with the snapshot that was active when they were created,
//! never with the latest rate, so the book only ever grows.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zahra_shared::types::{CurrencyCode, ExchangeOperator};

use super::format::symbol_for;

/// Errors raised when recording exchange rates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateError {
    /// Rate must be positive.
    #[error("Exchange rate for {0} must be positive")]
    NonPositiveRate(CurrencyCode),

    /// The base currency is always worth exactly 1.
    #[error("Cannot record an exchange rate for the base currency")]
    BaseCurrencySnapshot,
}

/// A currency known to the company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Currency code.
    pub code: CurrencyCode,
    /// Display symbol.
    pub symbol: String,
    /// How this currency's rate is applied.
    #[serde(default)]
    pub exchange_operator: ExchangeOperator,
}

impl Currency {
    /// Creates a currency using the built-in symbol for its code.
    #[must_use]
    pub fn new(code: CurrencyCode, exchange_operator: ExchangeOperator) -> Self {
        Self {
            symbol: symbol_for(&code).to_string(),
            code,
            exchange_operator,
        }
    }
}

/// A dated exchange rate relative to the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    /// Currency the rate applies to.
    pub currency_code: CurrencyCode,
    /// Rate relative to the base currency.
    pub rate_to_base: Decimal,
    /// Date the rate takes effect.
    pub effective_date: NaiveDate,
    /// When the snapshot was recorded.
    pub created_at: DateTime<Utc>,
}

impl ExchangeRateSnapshot {
    fn ordering_key(&self) -> (NaiveDate, DateTime<Utc>) {
        (self.effective_date, self.created_at)
    }
}

/// Rate and operator frozen for a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuote {
    /// Currency quoted.
    pub currency_code: CurrencyCode,
    /// Rate to apply.
    pub rate: Decimal,
    /// Operator to apply.
    pub operator: ExchangeOperator,
    /// Effective date of the underlying snapshot, `None` for the base currency.
    pub effective_date: Option<NaiveDate>,
}

/// Append-only book of currencies and their rate snapshots.
#[derive(Debug, Clone, Default)]
pub struct RateBook {
    currencies: HashMap<CurrencyCode, Currency>,
    snapshots: Vec<ExchangeRateSnapshot>,
}

impl RateBook {
    /// Creates an empty rate book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a currency definition.
    pub fn register_currency(&mut self, currency: Currency) {
        self.currencies.insert(currency.code.clone(), currency);
    }

    /// Returns the currency definition for `code`.
    #[must_use]
    pub fn currency(&self, code: &CurrencyCode) -> Option<&Currency> {
        self.currencies.get(code)
    }

    /// Returns the operator for `code`, defaulting to multiply.
    #[must_use]
    pub fn operator_for(&self, code: &CurrencyCode) -> ExchangeOperator {
        self.currencies
            .get(code)
            .map(|c| c.exchange_operator)
            .unwrap_or_default()
    }

    /// Records a new snapshot. Existing snapshots are never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is not positive or the snapshot is for
    /// the base currency.
    pub fn record(&mut self, snapshot: ExchangeRateSnapshot) -> Result<(), RateError> {
        if snapshot.currency_code.is_base() {
            return Err(RateError::BaseCurrencySnapshot);
        }
        if snapshot.rate_to_base <= Decimal::ZERO {
            return Err(RateError::NonPositiveRate(snapshot.currency_code));
        }
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Returns all snapshots for `code`, newest first.
    #[must_use]
    pub fn history(&self, code: &CurrencyCode) -> Vec<&ExchangeRateSnapshot> {
        let mut history: Vec<_> = self
            .snapshots
            .iter()
            .filter(|s| &s.currency_code == code)
            .collect();
        history.sort_by_key(|s| std::cmp::Reverse(s.ordering_key()));
        history
    }

    /// Returns the latest snapshot, ordered by (effective_date desc, created_at desc).
    #[must_use]
    pub fn latest(&self, code: &CurrencyCode) -> Option<&ExchangeRateSnapshot> {
        self.snapshots
            .iter()
            .filter(|s| &s.currency_code == code)
            .max_by_key(|s| s.ordering_key())
    }

    /// Returns the snapshot that was in force on `date`.
    #[must_use]
    pub fn active_on(&self, code: &CurrencyCode, date: NaiveDate) -> Option<&ExchangeRateSnapshot> {
        self.snapshots
            .iter()
            .filter(|s| &s.currency_code == code && s.effective_date <= date)
            .max_by_key(|s| s.ordering_key())
    }

    /// Quotes the latest rate for `code`. The base currency always quotes 1.
    #[must_use]
    pub fn quote(&self, code: &CurrencyCode) -> Option<RateQuote> {
        if code.is_base() {
            return Some(Self::base_quote());
        }
        self.latest(code).map(|s| self.quote_from(s))
    }

    /// Quotes the rate that was in force for `code` on `date`.
    #[must_use]
    pub fn quote_on(&self, code: &CurrencyCode, date: NaiveDate) -> Option<RateQuote> {
        if code.is_base() {
            return Some(Self::base_quote());
        }
        self.active_on(code, date).map(|s| self.quote_from(s))
    }

    /// Returns the latest rate of every currency with at least one snapshot.
    #[must_use]
    pub fn latest_rates(&self) -> HashMap<CurrencyCode, Decimal> {
        let mut rates = HashMap::new();
        for code in self.snapshots.iter().map(|s| &s.currency_code) {
            if rates.contains_key(code) {
                continue;
            }
            if let Some(latest) = self.latest(code) {
                rates.insert(code.clone(), latest.rate_to_base);
            }
        }
        rates
    }

    fn base_quote() -> RateQuote {
        RateQuote {
            currency_code: CurrencyCode::base(),
            rate: Decimal::ONE,
            operator: ExchangeOperator::Multiply,
            effective_date: None,
        }
    }

    fn quote_from(&self, snapshot: &ExchangeRateSnapshot) -> RateQuote {
        RateQuote {
            currency_code: snapshot.currency_code.clone(),
            rate: snapshot.rate_to_base,
            operator: self.operator_for(&snapshot.currency_code),
            effective_date: Some(snapshot.effective_date),
        }
    }
}

/// Calculates the cross rate between two currencies from their rates to base.
///
/// The same currency yields 1. A missing or zero rate counts as 1.
#[must_use]
pub fn cross_rate(
    from: &CurrencyCode,
    to: &CurrencyCode,
    rates: &HashMap<CurrencyCode, Decimal>,
) -> Decimal {
    if from == to {
        return Decimal::ONE;
    }

    let rate_of = |code: &CurrencyCode| {
        rates
            .get(code)
            .copied()
            .filter(|rate| !rate.is_zero())
            .unwrap_or(Decimal::ONE)
    };

    rate_of(from)
        .checked_div(rate_of(to))
        .unwrap_or(Decimal::ONE)
}
