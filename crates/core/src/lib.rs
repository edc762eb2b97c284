//! Core business logic for Zahra.
//!
//! This crate contains the checks a transaction must pass before it is allowed
//! to leave the device. It has ZERO network or storage dependencies.
//!
//! # Modules
//!
//! - `currency` - Conversion to and from the base currency, rate snapshots, display formatting
//! - `routing` - Resolving a chosen treasury account to its currency sub-account
//! - `validation` - Payload pre-validation and the double-entry balance check
//! - `rejection` - Turning remote errors into user-facing messages

pub mod currency;
pub mod rejection;
pub mod routing;
pub mod validation;
