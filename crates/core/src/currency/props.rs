//! Property-based tests for currency conversion.
//!
//! - Round-trip law: converting to base and back loses at most a cent
//! - Identity: a rate of 0 or 1 never changes the amount
//! - Rounding: every converted amount has at most 2 decimal places
//! - Display: parsing a formatted amount returns the rounded amount

use proptest::prelude::*;
use rust_decimal::Decimal;
use zahra_shared::types::{CurrencyCode, ExchangeOperator};

use super::conversion::{convert_from_base, convert_to_base, round_money};
use super::format::{format_currency, parse_currency};

/// Strategy to generate signed amounts (-1,000,000.00 to 1,000,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate amounts with sub-cent precision.
fn precise_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate rates (0.0001 to 10000.0000), excluding 1.
fn rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64)
        .prop_filter("rate 1 is the identity fast path", |v| *v != 10_000)
        .prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate an operator together with a rate under which the base
/// amount carries at least as many units as the foreign amount.
fn widening_conversion() -> impl Strategy<Value = (ExchangeOperator, Decimal)> {
    prop_oneof![
        // multiply by 1.0001 .. 1000
        (10_001i64..10_000_000i64)
            .prop_map(|v| (ExchangeOperator::Multiply, Decimal::new(v, 4))),
        // divide by 0.0010 .. 0.9999
        (10i64..10_000i64).prop_map(|v| (ExchangeOperator::Divide, Decimal::new(v, 4))),
    ]
}

fn operator() -> impl Strategy<Value = ExchangeOperator> {
    prop_oneof![Just(ExchangeOperator::Multiply), Just(ExchangeOperator::Divide)]
}

fn currency() -> impl Strategy<Value = CurrencyCode> {
    prop::sample::select(vec!["SAR", "USD", "YER", "OMR", "CNY", "EUR"])
        .prop_map(|c| c.parse().unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Converting to base and back returns the amount within one cent.
    #[test]
    fn prop_round_trip_within_one_cent(
        amount in amount(),
        (operator, rate) in widening_conversion(),
    ) {
        let base = convert_to_base(amount, rate, operator);
        let back = convert_from_base(base, rate, operator);
        let drift = (back - round_money(amount)).abs();
        prop_assert!(
            drift <= Decimal::new(1, 2),
            "{} -> {} -> {} drifted by {}",
            amount, base, back, drift
        );
    }

    /// A rate of 1 or 0 returns the amount unchanged.
    #[test]
    fn prop_identity_rates(amount in precise_amount(), operator in operator()) {
        prop_assert_eq!(convert_to_base(amount, Decimal::ONE, operator), amount);
        prop_assert_eq!(convert_to_base(amount, Decimal::ZERO, operator), amount);
        prop_assert_eq!(convert_from_base(amount, Decimal::ONE, operator), amount);
    }

    /// Every converted amount is already rounded to cents.
    #[test]
    fn prop_converted_amounts_are_cents(
        amount in precise_amount(),
        rate in rate(),
        operator in operator(),
    ) {
        let base = convert_to_base(amount, rate, operator);
        prop_assert_eq!(base, round_money(base));
    }

    /// Conversion is deterministic, so re-deriving a posted figure reproduces it.
    #[test]
    fn prop_conversion_is_deterministic(
        amount in amount(),
        rate in rate(),
        operator in operator(),
    ) {
        prop_assert_eq!(
            convert_to_base(amount, rate, operator),
            convert_to_base(amount, rate, operator)
        );
    }

    /// Parsing a formatted amount returns the rounded amount.
    #[test]
    fn prop_parse_inverts_format(amount in precise_amount(), code in currency()) {
        let formatted = format_currency(amount, &code);
        prop_assert_eq!(parse_currency(&formatted), round_money(amount));
    }
}
