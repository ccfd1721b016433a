//! Error types for the Roundtable client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every Roundtable crate.
///
/// Variants are structured so callers can branch on the failure class
/// (transport vs. API rejection vs. local I/O) without string matching.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum RoundtableError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Network-level failure: connection refused/dropped, timeout, broken stream
    #[error("Transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The backend answered with a non-2xx status
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session has been ended and accepts no further exchanges
    #[error("Session '{0}' is no longer active")]
    SessionInactive(String),

    /// Caller supplied input that cannot be sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoundtableError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Transport error without an HTTP status
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Creates an Api error
    pub fn api(status: u16, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            detail: detail.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error (including a 404 from the API)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Api { status: 404, .. }
        )
    }

    /// Check if the failure happened on the wire rather than locally.
    ///
    /// Both transport failures and non-2xx responses count: either one
    /// aborts a streaming exchange.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Api { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Renders an error as the message shown to the user in the transcript.
///
/// Every exchange failure is surfaced through this function so the wording
/// stays consistent across transport, API and local failures.
pub fn user_facing_message(error: &RoundtableError) -> String {
    match error {
        RoundtableError::Transport { .. } => {
            "Connection to the roundtable was lost. Please try again.".to_string()
        }
        RoundtableError::Api { status, detail } if detail.trim().is_empty() => {
            format!("The roundtable request failed (HTTP {status}).")
        }
        RoundtableError::Api { detail, .. } => {
            format!("The roundtable request failed: {detail}")
        }
        RoundtableError::SessionInactive(_) => {
            "This roundtable session has ended.".to_string()
        }
        other => format!("Something went wrong: {other}"),
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RoundtableError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RoundtableError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RoundtableError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, RoundtableError>`.
pub type Result<T> = std::result::Result<T, RoundtableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_404_counts_as_not_found() {
        assert!(RoundtableError::api(404, "missing").is_not_found());
        assert!(RoundtableError::not_found("Session", "s-1").is_not_found());
        assert!(!RoundtableError::api(500, "boom").is_not_found());
    }

    #[test]
    fn test_user_facing_message_uses_api_detail() {
        let message = user_facing_message(&RoundtableError::api(422, "model not allowed"));
        assert!(message.contains("model not allowed"));

        let message = user_facing_message(&RoundtableError::api(502, "  "));
        assert!(message.contains("502"));
    }

    #[test]
    fn test_transport_message_hides_internals() {
        let error = RoundtableError::transport("tcp reset by peer 10.0.0.3:443");
        assert!(error.is_remote());
        assert!(!user_facing_message(&error).contains("10.0.0.3"));
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: RoundtableError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        match err {
            RoundtableError::Io { message } => assert!(message.contains("NotFound")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
