//! Error types for the libSQL touchpoint store.

use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error from libSQL.
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data in the database.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Record not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Insert collided with an existing primary key.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },
}

impl From<Error> for tally_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { kind, id } => tally_core::Error::NotFound { kind, id },
            Error::AlreadyExists { kind, id } => tally_core::Error::AlreadyExists { kind, id },
            Error::Serialization(e) => tally_core::Error::Serialization(e),
            other => tally_core::Error::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_its_kind() {
        let err: tally_core::Error = Error::NotFound {
            kind: "query",
            id: "q1".into(),
        }
        .into();
        assert!(matches!(err, tally_core::Error::NotFound { kind: "query", .. }));
    }

    #[test]
    fn invalid_data_becomes_store_error() {
        let err: tally_core::Error = Error::InvalidData("bad timestamp".into()).into();
        assert_eq!(err.to_string(), "store error: invalid data: bad timestamp");
    }
}
