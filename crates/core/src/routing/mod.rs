//! Currency-aware treasury account routing.
//!
//! Treasury accounts are organised as a parent cash or bank account with one
//! sub-account per currency ("Cash Box" -> "Cash Box - USD"). Routing sends a
//! payment to the sub-account of its currency without the user picking the leaf.

pub mod account;
pub mod router;

pub use account::Account;
pub use router::{RoutingError, resolve_treasury_account, route_to_child_by_currency};
pub use zahra_shared::config::RoutingPolicy;
