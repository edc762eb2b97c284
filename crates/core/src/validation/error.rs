//! Field-addressable validation errors.

use serde::Serialize;
use thiserror::Error;

/// A single correction the user must make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Path of the offending field, e.g. `items[0].quantity`.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All validation errors of one payload, raised at the submission boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed:\n{}", format_messages(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Returns the individual errors.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Returns true if any error addresses `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Returns the error code for user-facing messages.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        "VALIDATION_ERROR"
    }
}

fn format_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns a list of validation errors into a single aggregated error.
///
/// # Errors
///
/// Returns [`ValidationErrors`] if `errors` is not empty.
pub fn assert_valid(errors: Vec<ValidationError>) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_valid_empty_is_ok() {
        assert!(assert_valid(Vec::new()).is_ok());
    }

    #[test]
    fn test_assert_valid_aggregates_messages() {
        let err = assert_valid(vec![
            ValidationError::new("items", "At least one item is required"),
            ValidationError::new("paymentMethod", "Payment method is required"),
        ])
        .unwrap_err();

        assert_eq!(err.errors().len(), 2);
        assert!(err.has_field("paymentMethod"));
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(
            err.to_string(),
            "Validation failed:\nAt least one item is required\nPayment method is required"
        );
    }
}
