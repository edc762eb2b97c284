//! Common types used across the application.

pub mod currency;
pub mod id;

pub use currency::{BASE_CURRENCY, CurrencyCode, CurrencyCodeError, ExchangeOperator};
pub use id::*;
