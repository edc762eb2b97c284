//! Multi-currency handling and exchange rates.

pub mod conversion;
pub mod exchange;
pub mod format;
pub mod record;

#[cfg(test)]
mod props;

pub use conversion::{MONEY_DECIMAL_PLACES, NumericInput, convert_from_base, convert_to_base, round_money};
pub use exchange::{Currency, ExchangeRateSnapshot, RateBook, RateError, RateQuote, cross_rate};
pub use format::{format_currency, format_number, parse_currency, symbol_for};
pub use record::{MonetaryRecord, sum_in_base_currency, to_base_currency};
