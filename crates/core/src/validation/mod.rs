//! Pre-submission validation of transaction payloads and journal entries.
//!
//! The remote procedures remain the final arbiter of legality. These checks
//! catch user-correctable mistakes before a network round-trip and address
//! each one to the field that needs fixing:
//! - Line items and sale/purchase payloads, including returns
//! - Receipt and payment vouchers
//! - Journal entry drafts and the double-entry balance check

pub mod error;
pub mod journal;
pub mod line_items;
pub mod payload;
pub mod payment;

#[cfg(test)]
mod journal_props;

pub use error::{ValidationError, ValidationErrors, assert_valid};
pub use journal::{
    BALANCE_TOLERANCE, JournalEntryDraft, JournalError, JournalLine, JournalTotals,
    check_journal_balance, validate_journal_entry,
};
pub use line_items::{LineItemInput, validate_line_items};
pub use payload::{
    PaymentMethod, PurchasePayload, SalePayload, validate_purchase_payload,
    validate_purchase_return_payload, validate_sale_payload, validate_sale_return_payload,
};
pub use payment::{BondType, CounterpartyType, PaymentPayload, validate_payment_payload};
