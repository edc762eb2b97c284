//! Double-entry balance check for manually composed journal entries.
//!
//! Unlike the invoice checks this one substitutes for a server guarantee:
//! an unbalanced journal must never be submitted at all.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zahra_shared::types::{AccountId, CurrencyCode};

use super::error::ValidationError;

/// Maximum debit/credit difference still considered balanced (0.01).
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Errors from the journal balance check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JournalError {
    /// Nothing has been entered yet; a zero total is not a balanced state.
    #[error("Journal entry is not balanced: no amounts have been entered")]
    NotFilled,

    /// Debits and credits differ by at least the tolerance.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },
}

impl JournalError {
    /// Returns the error code for user-facing messages.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFilled => "JOURNAL_NOT_FILLED",
            Self::Unbalanced { .. } => "UNBALANCED_JOURNAL",
        }
    }
}

/// One line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Account debited or credited.
    pub account_id: AccountId,
    /// Line memo.
    #[serde(default)]
    pub description: Option<String>,
    /// Debit amount.
    #[serde(default)]
    pub debit_amount: Decimal,
    /// Credit amount.
    #[serde(default)]
    pub credit_amount: Decimal,
}

impl JournalLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            description: None,
            debit_amount: amount,
            credit_amount: Decimal::ZERO,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            description: None,
            debit_amount: Decimal::ZERO,
            credit_amount: amount,
        }
    }
}

/// Debit and credit sums of a set of lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JournalTotals {
    /// Sum of debit amounts.
    pub debit: Decimal,
    /// Sum of credit amounts.
    pub credit: Decimal,
}

impl JournalTotals {
    /// Sums the lines.
    #[must_use]
    pub fn from_lines(lines: &[JournalLine]) -> Self {
        lines.iter().fold(Self::default(), |acc, line| Self {
            debit: acc.debit + line.debit_amount,
            credit: acc.credit + line.credit_amount,
        })
    }

    /// Debit minus credit.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }

    /// True when `|debit - credit| < 0.01` and the debit total is positive.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.difference().abs() < BALANCE_TOLERANCE && self.debit > Decimal::ZERO
    }
}

/// Checks that `lines` balance and carry a positive total.
///
/// # Errors
///
/// Returns [`JournalError::Unbalanced`] if debits and credits differ, and
/// [`JournalError::NotFilled`] if they agree but the total is not positive.
pub fn check_journal_balance(lines: &[JournalLine]) -> Result<JournalTotals, JournalError> {
    let totals = JournalTotals::from_lines(lines);

    if totals.difference().abs() >= BALANCE_TOLERANCE {
        return Err(JournalError::Unbalanced {
            debit: totals.debit,
            credit: totals.credit,
        });
    }

    if totals.debit <= Decimal::ZERO {
        return Err(JournalError::NotFilled);
    }

    Ok(totals)
}

/// A journal entry as composed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryDraft {
    /// Entry date.
    pub date: NaiveDate,
    /// Entry description, required.
    #[serde(default)]
    pub description: String,
    /// External reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Entry currency, base currency when absent.
    #[serde(default)]
    pub currency_code: Option<CurrencyCode>,
    /// Snapshot rate for foreign-currency entries.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    /// Entry lines.
    #[serde(default)]
    pub lines: Vec<JournalLine>,
}

/// Validates a journal entry draft, including the balance check.
#[must_use]
pub fn validate_journal_entry(draft: &JournalEntryDraft) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if draft.description.trim().is_empty() {
        errors.push(ValidationError::new("description", "Description is required"));
    }

    if draft.lines.len() < 2 {
        errors.push(ValidationError::new(
            "lines",
            "A journal entry requires at least two lines",
        ));
    }

    for (index, line) in draft.lines.iter().enumerate() {
        let number = index + 1;
        if line.debit_amount < Decimal::ZERO || line.credit_amount < Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("lines[{index}]"),
                format!("Line {number}: amounts cannot be negative"),
            ));
        } else if line.debit_amount > Decimal::ZERO && line.credit_amount > Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("lines[{index}]"),
                format!("Line {number}: a line is either a debit or a credit, not both"),
            ));
        }
    }

    if draft.exchange_rate.is_some_and(|rate| rate <= Decimal::ZERO) {
        errors.push(ValidationError::new(
            "exchangeRate",
            "Exchange rate must be positive",
        ));
    }

    if let Err(err) = check_journal_balance(&draft.lines) {
        errors.push(ValidationError::new("lines", err.to_string()));
    }

    errors
}
