//! Chart of accounts entries as seen by the router.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zahra_shared::types::{AccountId, CurrencyCode};

/// A ledger account.
///
/// `balance` is owned by the server and read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Hierarchical code, e.g. "1010" or "101001".
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type (asset, liability, ...).
    #[serde(rename = "type")]
    pub account_type: String,
    /// Currency of the account, base currency when absent.
    #[serde(default)]
    pub currency_code: Option<CurrencyCode>,
    /// Explicit parent account.
    #[serde(default)]
    pub parent_id: Option<AccountId>,
    /// System accounts cannot be deleted by users.
    #[serde(default)]
    pub is_system: bool,
    /// Current balance.
    #[serde(default)]
    pub balance: Decimal,
}

impl Account {
    /// Returns the account currency, defaulting to the base currency.
    #[must_use]
    pub fn effective_currency(&self) -> CurrencyCode {
        self.currency_code.clone().unwrap_or_default()
    }

    /// Returns true if this account's code is a strict numeric prefix of `other`'s.
    #[must_use]
    pub fn is_code_parent_of(&self, other: &Account) -> bool {
        other.code.len() > self.code.len()
            && other.code.starts_with(&self.code)
            && other.code.chars().all(|c| c.is_ascii_digit())
    }

    /// Returns true if `other` is a sub-account of this one.
    ///
    /// An explicit `parent_id` decides. Rows without one fall back to the
    /// code prefix relation.
    #[must_use]
    pub fn is_parent_of(&self, other: &Account) -> bool {
        match other.parent_id {
            Some(parent_id) => parent_id == self.id,
            None => self.is_code_parent_of(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(code: &str, currency: Option<&str>) -> Account {
        Account {
            id: AccountId::new(),
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type: "asset".to_string(),
            currency_code: currency.map(|c| c.parse().unwrap()),
            parent_id: None,
            is_system: false,
            balance: Decimal::ZERO,
        }
    }

    #[test]
    fn test_effective_currency_defaults_to_base() {
        assert!(account("1010", None).effective_currency().is_base());
        assert_eq!(account("101001", Some("USD")).effective_currency(), "USD");
    }

    #[test]
    fn test_code_prefix_relation() {
        let cash = account("1010", None);
        let usd = account("101001", Some("USD"));
        let bank = account("1020", None);

        assert!(cash.is_code_parent_of(&usd));
        assert!(!usd.is_code_parent_of(&cash));
        assert!(!cash.is_code_parent_of(&bank));
        assert!(!cash.is_code_parent_of(&cash));
    }

    #[test]
    fn test_explicit_parent_relation() {
        let cash = account("1010", None);
        let mut usd = account("102001", Some("USD"));
        assert!(!cash.is_parent_of(&usd));
        usd.parent_id = Some(cash.id);
        assert!(cash.is_parent_of(&usd));
    }

    #[test]
    fn test_parent_id_overrides_code_prefix() {
        let cash = account("1010", None);
        let bank = account("1020", None);
        let mut usd = account("101001", Some("USD"));

        // No parent_id: the code decides
        assert!(cash.is_parent_of(&usd));
        assert!(!bank.is_parent_of(&usd));

        usd.parent_id = Some(bank.id);
        assert!(!cash.is_parent_of(&usd));
        assert!(bank.is_parent_of(&usd));
    }

    #[test]
    fn test_deserialize_backend_shape() {
        let json = r#"{
            "id": "0191d5a8-7c9e-7cc2-9b8e-3f6a2d1c0b9a",
            "code": "1010",
            "name": "Cash Box",
            "type": "asset",
            "currency_code": null,
            "parent_id": null,
            "is_system": true,
            "balance": "1500.25"
        }"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.account_type, "asset");
        assert!(account.is_system);
        assert!(account.currency_code.is_none());
    }
}
