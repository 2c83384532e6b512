//! Error types for the OVSDB protocol core

use thiserror::Error;

/// Main error type for OVSDB client operations
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Malformed wire values
    // ========================================================================
    #[error("Not an OVSDB set")]
    NotSet,

    #[error("Not a StringSet")]
    NotStringSet,

    #[error("Not an OVSDB map")]
    NotMap,

    #[error("Not an OVSDB uuid")]
    NotUuid,

    #[error("Not an OVSDB named-uuid")]
    NotNamedUuid,

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Invalid version: {0:?}")]
    InvalidVersion(String),

    #[error("Unknown atomic type: {0:?}")]
    UnknownAtomicType(String),

    #[error("Malformed value: {0}")]
    Malformed(String),

    // ========================================================================
    // Operation validation
    // ========================================================================
    #[error("{op} operation is missing required field {field:?}")]
    MissingField {
        op: &'static str,
        field: &'static str,
    },

    #[error("Invalid condition function: {0:?}")]
    InvalidCondition(String),

    #[error("Invalid mutation mutator: {0:?}")]
    InvalidMutation(String),

    // ========================================================================
    // Protocol / RPC
    // ========================================================================
    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("RPC error: {0}")]
    Rpc(serde_json::Value),

    // ========================================================================
    // Transport
    // ========================================================================
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a missing-field validation error
    pub fn missing(op: &'static str, field: &'static str) -> Self {
        Error::MissingField { op, field }
    }

    /// Create a protocol violation error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Create a malformed value error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }

    /// Returns true for decode failures of a wire value
    pub fn is_malformed_wire(&self) -> bool {
        matches!(
            self,
            Error::NotSet
                | Error::NotStringSet
                | Error::NotMap
                | Error::NotUuid
                | Error::NotNamedUuid
                | Error::InvalidIdentifier(_)
                | Error::InvalidVersion(_)
                | Error::UnknownAtomicType(_)
                | Error::Malformed(_)
        )
    }

    /// Returns true for errors detected while validating an operation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingField { .. } | Error::InvalidCondition(_) | Error::InvalidMutation(_)
        )
    }

    /// Returns true if the session that produced this error is unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::ConnectionClosed | Error::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(Error::NotSet.is_malformed_wire());
        assert!(!Error::NotSet.is_validation());
        assert!(Error::missing("insert", "table").is_validation());
        assert!(Error::ConnectionClosed.is_fatal());
        assert!(!Error::protocol("short reply").is_fatal());
    }

    #[test]
    fn test_missing_field_message() {
        let err = Error::missing("insert", "row");
        assert_eq!(err.to_string(), "insert operation is missing required field \"row\"");
    }

    #[test]
    fn test_invalid_mutation_names_value() {
        let err = Error::InvalidMutation("invalid".into());
        assert!(err.to_string().contains("invalid"));
    }
}
