//! Turns remote procedure failures into user-facing messages.
//!
//! Raw transport and database errors are never shown to the user as-is.
//! Every failure is mapped to a message, a severity, and optionally a
//! suggested action.

use std::fmt;

use serde::Serialize;

/// Code used when the remote side did not send one.
pub const UNKNOWN_CODE: &str = "UNKNOWN";

/// Code assigned to transport failures.
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

/// Message substrings that identify a transport failure.
const NETWORK_FAILURE_MARKERS: &[&str] = &[
    "failed to fetch",
    "networkerror",
    "load failed",
    "network request failed",
    "connection refused",
    "error sending request",
    "timed out",
];

/// How serious a failure is for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational.
    Low,
    /// The user can fix it.
    Medium,
    /// Needs attention, the operation cannot proceed.
    High,
    /// The system is misconfigured.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A failure ready to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserFacingError {
    /// Machine-readable code, the remote code when one was sent.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Suggested next step, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
}

impl UserFacingError {
    fn new(code: &str, message: &str, severity: Severity, action_label: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            severity,
            action_label: action_label.map(str::to_string),
        }
    }

    /// True for failures worth retrying later (the remote was never reached).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.code == NETWORK_ERROR_CODE
    }
}

impl fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Returns true if `message` describes a transport failure.
#[must_use]
pub fn is_network_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    NETWORK_FAILURE_MARKERS.iter().any(|m| lower.contains(m))
}

/// The error shown when the server could not be reached.
#[must_use]
pub fn network_error() -> UserFacingError {
    UserFacingError::new(
        NETWORK_ERROR_CODE,
        "Could not reach the server. Please check your internet connection.",
        Severity::High,
        Some("Refresh"),
    )
}

/// Maps a remote failure to a user-facing error.
///
/// Network failures are recognised by message, everything else by code.
/// Unknown codes pass the remote message through, or a generic message when
/// it is empty.
#[must_use]
pub fn parse_remote_error(code: Option<&str>, message: &str) -> UserFacingError {
    if is_network_failure(message) {
        return network_error();
    }

    let code = code.filter(|c| !c.is_empty()).unwrap_or(UNKNOWN_CODE);
    match code {
        "23505" => UserFacingError::new(
            code,
            "This record (SKU or name) already exists.",
            Severity::Medium,
            Some("Change the value"),
        ),
        "PGRST116" => UserFacingError::new(
            code,
            "The required tables do not exist in the database.",
            Severity::Critical,
            Some("Update the schema"),
        ),
        "42501" => UserFacingError::new(
            code,
            "You do not have permission to perform this operation.",
            Severity::High,
            Some("Request access"),
        ),
        "AuthApiError" | "invalid_credentials" => UserFacingError::new(
            code,
            "Invalid sign-in details. Please check your email and password.",
            Severity::Medium,
            None,
        ),
        "user_already_exists" => UserFacingError::new(
            code,
            "This email address is already registered.",
            Severity::Medium,
            None,
        ),
        _ => {
            let message = if message.trim().is_empty() {
                "An unexpected error occurred, please try again later."
            } else {
                message
            };
            UserFacingError::new(code, message, Severity::Medium, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_failures_by_message() {
        for message in [
            "TypeError: Failed to fetch",
            "NetworkError when attempting to fetch resource.",
            "connection refused",
        ] {
            let err = parse_remote_error(Some("23505"), message);
            assert_eq!(err.code, NETWORK_ERROR_CODE);
            assert_eq!(err.severity, Severity::High);
            assert!(err.is_transient());
        }
    }

    #[test]
    fn test_known_codes() {
        let unique = parse_remote_error(Some("23505"), "duplicate key value");
        assert_eq!(unique.severity, Severity::Medium);
        assert_eq!(unique.action_label.as_deref(), Some("Change the value"));

        assert_eq!(
            parse_remote_error(Some("PGRST116"), "").severity,
            Severity::Critical
        );
        assert_eq!(parse_remote_error(Some("42501"), "denied").severity, Severity::High);
        assert_eq!(
            parse_remote_error(Some("invalid_credentials"), "x").code,
            "invalid_credentials"
        );
        assert!(!parse_remote_error(Some("42501"), "denied").is_transient());
    }

    #[test]
    fn test_unknown_code_passes_message_through() {
        let err = parse_remote_error(Some("P0001"), "Insufficient stock for product");
        assert_eq!(err.code, "P0001");
        assert_eq!(err.message, "Insufficient stock for product");
        assert_eq!(err.to_string(), "Insufficient stock for product");
    }

    #[test]
    fn test_missing_code_and_message() {
        let err = parse_remote_error(None, "  ");
        assert_eq!(err.code, UNKNOWN_CODE);
        assert_eq!(err.message, "An unexpected error occurred, please try again later.");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert_eq!(Severity::Medium.to_string(), "medium");
    }
}
