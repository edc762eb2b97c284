//! Currency codes and exchange operators.
//!
//! Codes are open-ended strings (any company may add a currency), so unlike a
//! closed enum they are validated only for shape and normalised to upper case.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code of the single base currency every snapshot and balance is expressed in.
pub const BASE_CURRENCY: &str = "SAR";

/// Currency code parsing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CurrencyCodeError {
    /// Blank input.
    #[error("Currency code is empty")]
    Empty,

    /// Anything other than ASCII letters.
    #[error("Invalid currency code: {0}")]
    Invalid(String),
}

/// ISO-like currency code, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Returns the base currency code.
    #[must_use]
    pub fn base() -> Self {
        Self(BASE_CURRENCY.to_string())
    }

    /// Returns true if this is the base currency.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.0 == BASE_CURRENCY
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::base()
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() {
            return Err(CurrencyCodeError::Empty);
        }
        if !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyCodeError::Invalid(s.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl PartialEq<str> for CurrencyCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CurrencyCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// How a currency's rate relates a foreign amount to the base amount.
///
/// - `Multiply`: base = foreign × rate
/// - `Divide`: base = foreign ÷ rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeOperator {
    /// Rate is "base units per foreign unit".
    #[default]
    Multiply,
    /// Rate is "foreign units per base unit".
    Divide,
}

impl ExchangeOperator {
    /// Returns the operator that undoes this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Multiply => Self::Divide,
            Self::Divide => Self::Multiply,
        }
    }
}

impl std::fmt::Display for ExchangeOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Multiply => write!(f, "multiply"),
            Self::Divide => write!(f, "divide"),
        }
    }
}
