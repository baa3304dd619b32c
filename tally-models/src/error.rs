//! Error types for remote model clients.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while calling a remote model.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP client could not be built.
    #[error("client configuration error: {0}")]
    Client(String),

    /// Request failed before a response arrived.
    #[error("request failed: {0}")]
    Request(String),

    /// The remote did not answer within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The remote answered with a non-success status.
    #[error("model API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_includes_status() {
        let err = Error::Api {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "model API returned status 503: overloaded"
        );
    }

    #[test]
    fn error_from_serde_json() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
