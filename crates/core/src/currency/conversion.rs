//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Round to 2 decimal places immediately after every conversion, never at display time
//! - Round half away from zero on the cents boundary
//! - Totals are sums of already-rounded amounts, so a posted figure re-derives exactly

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;
use zahra_shared::types::ExchangeOperator;

/// Decimal places kept for every monetary amount.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// A numeric value as read from an upstream record, possibly missing or malformed.
///
/// `None` from [`NumericInput::to_decimal`] means "not a finite number".
pub trait NumericInput {
    /// Returns the value as a decimal, or `None` if it is missing or not finite.
    fn to_decimal(&self) -> Option<Decimal>;
}

impl NumericInput for Decimal {
    fn to_decimal(&self) -> Option<Decimal> {
        Some(*self)
    }
}

impl NumericInput for Option<Decimal> {
    fn to_decimal(&self) -> Option<Decimal> {
        *self
    }
}

impl NumericInput for f64 {
    fn to_decimal(&self) -> Option<Decimal> {
        if self.is_finite() {
            Decimal::from_f64(*self)
        } else {
            None
        }
    }
}

impl NumericInput for Option<f64> {
    fn to_decimal(&self) -> Option<Decimal> {
        self.and_then(|value| value.to_decimal())
    }
}

/// Rounds a monetary value to cents, half away from zero.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a foreign-currency amount to the base currency.
///
/// - A missing or zero rate, or a rate of exactly 1, returns `amount` unchanged.
/// - A missing or non-finite amount returns 0 and emits a diagnostic event.
/// - Otherwise `amount × rate` (multiply) or `amount ÷ rate` (divide), rounded to cents.
#[must_use]
pub fn convert_to_base(
    amount: impl NumericInput,
    rate: impl NumericInput,
    operator: ExchangeOperator,
) -> Decimal {
    convert(amount.to_decimal(), rate.to_decimal(), operator)
}

/// Converts a base-currency amount back to the foreign currency.
///
/// The exact inverse of [`convert_to_base`]: multiply becomes divide and
/// vice versa, with the same guards and rounding.
#[must_use]
pub fn convert_from_base(
    amount: impl NumericInput,
    rate: impl NumericInput,
    operator: ExchangeOperator,
) -> Decimal {
    convert(amount.to_decimal(), rate.to_decimal(), operator.inverse())
}

fn convert(amount: Option<Decimal>, rate: Option<Decimal>, operator: ExchangeOperator) -> Decimal {
    let Some(amount) = amount else {
        warn!(
            target: "zahra::conversion",
            "malformed amount coerced to zero"
        );
        return Decimal::ZERO;
    };

    let rate = match rate {
        Some(rate) if !rate.is_zero() && rate != Decimal::ONE => rate,
        _ => return amount,
    };

    let converted = match operator {
        ExchangeOperator::Multiply => amount.checked_mul(rate),
        ExchangeOperator::Divide => amount.checked_div(rate),
    };

    if let Some(converted) = converted {
        round_money(converted)
    } else {
        warn!(
            target: "zahra::conversion",
            %amount,
            %rate,
            %operator,
            "conversion overflowed, coerced to zero"
        );
        Decimal::ZERO
    }
}
