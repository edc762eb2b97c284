//! Display formatting and parsing of monetary amounts.
//!
//! `parse_currency` is the exact inverse of `format_currency`: any string the
//! formatter produces parses back to the rounded amount.

use rust_decimal::{Decimal, RoundingStrategy};
use zahra_shared::types::CurrencyCode;

use super::conversion::round_money;

/// Currency whose symbol is written before the amount.
pub const PREFIX_CURRENCY: &str = "USD";

/// Built-in currency symbols.
pub const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("SAR", "ر.س"),
    ("YER", "ر.ي"),
    ("USD", "$"),
    ("OMR", "ر.ع"),
    ("CNY", "¥"),
    ("EGP", "ج.م"),
    ("AED", "د.إ"),
    ("KWD", "د.ك"),
    ("BHD", "د.ب"),
    ("QAR", "ر.ق"),
];

/// Returns the display symbol for `code`, or the code itself when unknown.
#[must_use]
pub fn symbol_for(code: &CurrencyCode) -> &str {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(c, _)| code == c)
        .map_or(code.as_str(), |(_, symbol)| *symbol)
}

/// Formats an amount with thousands separators, 2 decimals, and the currency symbol.
///
/// ```
/// use rust_decimal_macros::dec;
/// use zahra_core::currency::format_currency;
///
/// assert_eq!(format_currency(dec!(1234.56), &"USD".parse().unwrap()), "$1,234.56");
/// assert_eq!(format_currency(dec!(1234.56), &"SAR".parse().unwrap()), "1,234.56 ر.س");
/// ```
#[must_use]
pub fn format_currency(amount: Decimal, code: &CurrencyCode) -> String {
    let rounded = round_money(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let number = group_thousands(&digits);
    let symbol = symbol_for(code);

    if code == PREFIX_CURRENCY {
        format!("{sign}{symbol}{number}")
    } else {
        format!("{sign}{number} {symbol}")
    }
}

/// Formats a number with thousands separators and up to 3 decimals, no symbol.
#[must_use]
pub fn format_number(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{}", group_thousands(&rounded.abs().to_string()))
}

/// Parses a formatted currency string back to a number.
///
/// Strips every known symbol, whole currency-code words, and thousands
/// separators. Anything else is left for the number parser, so unparsable
/// input yields 0.
#[must_use]
pub fn parse_currency(text: &str) -> Decimal {
    let mut cleaned = text.to_string();
    for (_, symbol) in CURRENCY_SYMBOLS {
        cleaned = cleaned.replace(*symbol, " ");
    }

    let number: String = cleaned
        .split_whitespace()
        .filter(|word| !is_currency_code(word))
        .flat_map(str::chars)
        .filter(|c| *c != ',')
        .collect();

    number.parse().unwrap_or(Decimal::ZERO)
}

fn is_currency_code(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_alphabetic())
}

fn group_thousands(digits: &str) -> String {
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{grouped}.{fraction}"),
        None => grouped,
    }
}
