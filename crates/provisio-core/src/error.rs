//! Error types for provisio-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Transport could not be established or died
    #[error("connection error: {0}")]
    Connection(String),

    /// Initial handshake did not complete
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Join/leave was rejected by the server; fatal for the session
    #[error("group protocol error: {message}")]
    Group {
        /// Machine-readable error code, when the server sent one
        code: Option<String>,
        /// Detailed message
        message: String,
    },

    /// Operation requires an established session
    #[error("not connected")]
    NotConnected,

    /// Invalid configuration
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Wire (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_error_display() {
        let error = Error::Group {
            code: Some("TENANT_UNKNOWN".to_string()),
            message: "no such tenant".to_string(),
        };
        assert_eq!(error.to_string(), "group protocol error: no such tenant");
    }

    #[test]
    fn test_serialization_error_converts() {
        let bad = serde_json::from_str::<crate::ProgressEvent>("{");
        let error: Error = bad.unwrap_err().into();
        assert!(matches!(error, Error::Serialization(_)));
    }
}
