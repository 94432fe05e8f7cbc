//! Oracle error types

use thiserror::Error;

/// Failure talking to the remote oracle.
///
/// The controller treats every kind the same way (a single network failure);
/// the classification exists for logging.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OracleError {
    pub kind: OracleErrorKind,
    pub message: String,
}

impl OracleError {
    pub fn new(kind: OracleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Network, message)
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Status(code), message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Decode, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleErrorKind {
    /// Connection failure, timeout, or an unreadable body
    Network,
    /// Non-success HTTP status
    Status(u16),
    /// Response did not match the expected shape
    Decode,
}
