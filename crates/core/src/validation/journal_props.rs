//! Property-based tests for the journal balance check.

use proptest::prelude::*;
use rust_decimal::Decimal;
use zahra_shared::types::AccountId;

use super::journal::{JournalError, JournalLine, JournalTotals, check_journal_balance};

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Mirrors each debit with an equal credit, so the lines always balance.
fn mirrored_lines(amounts: &[Decimal]) -> Vec<JournalLine> {
    amounts
        .iter()
        .flat_map(|amount| {
            [
                JournalLine::debit(AccountId::new(), *amount),
                JournalLine::credit(AccountId::new(), *amount),
            ]
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Mirrored debits and credits always pass.
    #[test]
    fn prop_mirrored_lines_balance(amounts in prop::collection::vec(positive_amount(), 1..10)) {
        let lines = mirrored_lines(&amounts);
        let totals = check_journal_balance(&lines);
        prop_assert!(totals.is_ok(), "expected balanced, got {:?}", totals);
        prop_assert!(JournalTotals::from_lines(&lines).is_balanced());
    }

    /// Skewing one side by a cent or more always fails.
    #[test]
    fn prop_skewed_lines_rejected(
        amounts in prop::collection::vec(positive_amount(), 1..10),
        skew in positive_amount(),
    ) {
        let mut lines = mirrored_lines(&amounts);
        lines.push(JournalLine::debit(AccountId::new(), skew));

        let result = check_journal_balance(&lines);
        prop_assert!(
            matches!(result, Err(JournalError::Unbalanced { .. })),
            "expected unbalanced, got {:?}",
            result
        );
    }

    /// The balance check agrees with `is_balanced` on arbitrary lines.
    #[test]
    fn prop_check_agrees_with_is_balanced(
        debits in prop::collection::vec(0i64..10_000i64, 0..6),
        credits in prop::collection::vec(0i64..10_000i64, 0..6),
    ) {
        let lines: Vec<_> = debits
            .iter()
            .map(|cents| JournalLine::debit(AccountId::new(), Decimal::new(*cents, 2)))
            .chain(
                credits
                    .iter()
                    .map(|cents| JournalLine::credit(AccountId::new(), Decimal::new(*cents, 2))),
            )
            .collect();

        prop_assert_eq!(
            check_journal_balance(&lines).is_ok(),
            JournalTotals::from_lines(&lines).is_balanced()
        );
    }
}
