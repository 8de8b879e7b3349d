//! Error types for session-audit

use thiserror::Error;

/// Errors that can occur while auditing sessions and delivering reports
#[derive(Debug, Error)]
pub enum AuditError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport could not complete the exchange (connect, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status
    #[error("Report delivery rejected with status {status}: {body}")]
    Delivery {
        status: u16,
        body: String,
    },

    /// Replay artifact missing or unreadable
    #[error("Artifact error for '{path}': {reason}")]
    Artifact {
        path: String,
        reason: String,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client state was already torn down when an event referenced it
    #[error("Client state unavailable: {0}")]
    ClientState(String),

    /// Report submitted after shutdown began
    #[error("Reporting is shutting down")]
    ShuttingDown,

    /// Background report task failed to run to completion
    #[error("Report task failed: {0}")]
    Task(String),
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_display() {
        let err = AuditError::Delivery {
            status: 413,
            body: "payload too large".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Report delivery rejected with status 413: payload too large"
        );
    }

    #[test]
    fn test_serialization_error_from() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AuditError = parse.into();
        assert!(matches!(err, AuditError::Serialization(_)));
    }
}
