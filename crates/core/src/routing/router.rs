//! Routes a selected treasury account to its currency sub-account.

use thiserror::Error;
use tracing::{info, warn};
use zahra_shared::config::RoutingPolicy;
use zahra_shared::types::{AccountId, CurrencyCode};

use super::account::Account;

/// Errors raised when resolving the account that receives a posting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// The selected account no longer exists; the user must pick again.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The parent has no sub-account in the transaction currency.
    #[error("Account {parent} has no sub-account for currency {currency}")]
    NoCurrencyChild {
        /// The selected parent account.
        parent: AccountId,
        /// The transaction currency.
        currency: CurrencyCode,
    },
}

impl RoutingError {
    /// Returns the error code for user-facing messages.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::NoCurrencyChild { .. } => "NO_CURRENCY_CHILD",
        }
    }
}

/// Returns the child of `parent_id` held in `currency`, or the parent itself.
///
/// Returns `None` only when `parent_id` is not in `accounts`. A missing
/// currency, or a currency no child carries, yields the parent unchanged.
#[must_use]
pub fn route_to_child_by_currency<'a>(
    accounts: &'a [Account],
    parent_id: &AccountId,
    currency: Option<&CurrencyCode>,
) -> Option<&'a Account> {
    let parent = accounts.iter().find(|a| &a.id == parent_id)?;

    let Some(currency) = currency else {
        return Some(parent);
    };

    match find_currency_child(accounts, parent, currency) {
        Some(child) => {
            info!(
                parent = %parent.code,
                child = %child.code,
                %currency,
                "routed to currency sub-account"
            );
            Some(child)
        }
        None => Some(parent),
    }
}

/// Resolves the account a treasury posting lands on, applying `policy` when
/// no currency sub-account matches.
///
/// # Errors
///
/// Returns [`RoutingError::AccountNotFound`] if the parent is missing, and
/// [`RoutingError::NoCurrencyChild`] under [`RoutingPolicy::RequireCurrencyChild`]
/// when the parent has no sub-account for a foreign currency.
pub fn resolve_treasury_account<'a>(
    accounts: &'a [Account],
    parent_id: &AccountId,
    currency: Option<&CurrencyCode>,
    policy: RoutingPolicy,
) -> Result<&'a Account, RoutingError> {
    let routed = route_to_child_by_currency(accounts, parent_id, currency)
        .ok_or(RoutingError::AccountNotFound(*parent_id))?;

    let Some(currency) = currency else {
        return Ok(routed);
    };

    // Either a sub-account matched or the parent already holds this currency.
    if &routed.id != parent_id || &routed.effective_currency() == currency {
        return Ok(routed);
    }

    let parent = routed;
    match policy {
        RoutingPolicy::FallbackToParent => {
            if accounts.iter().any(|a| parent.is_parent_of(a)) {
                warn!(
                    parent = %parent.code,
                    %currency,
                    "no sub-account for currency, posting to parent"
                );
            }
            Ok(parent)
        }
        RoutingPolicy::RequireCurrencyChild => Err(RoutingError::NoCurrencyChild {
            parent: parent.id,
            currency: currency.clone(),
        }),
    }
}

fn find_currency_child<'a>(
    accounts: &'a [Account],
    parent: &Account,
    currency: &CurrencyCode,
) -> Option<&'a Account> {
    accounts
        .iter()
        .filter(|a| parent.is_parent_of(a))
        .find(|a| &a.effective_currency() == currency)
}
