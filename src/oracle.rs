//! Remote oracle boundary
//!
//! The controller only sees [`OracleClient`]; transport details live in the
//! adapters.

mod error;
pub mod http;
pub mod types;

pub use error::{OracleError, OracleErrorKind};
pub use http::HttpOracleClient;
pub use types::{InitialSnapshot, OracleInput, OracleReply};

use async_trait::async_trait;
use std::sync::Arc;

/// The external reasoning service.
///
/// Each call has a server-side effect; callers must not duplicate calls.
#[async_trait]
pub trait OracleClient: Send + Sync {
    /// Fetch (or create) the session's state
    async fn initialize(&self, session_id: &str) -> Result<InitialSnapshot, OracleError>;

    /// Submit user input and receive the next reply
    async fn advance(
        &self,
        session_id: &str,
        input: &OracleInput,
    ) -> Result<OracleReply, OracleError>;
}

#[async_trait]
impl<T: OracleClient + ?Sized> OracleClient for Arc<T> {
    async fn initialize(&self, session_id: &str) -> Result<InitialSnapshot, OracleError> {
        (**self).initialize(session_id).await
    }

    async fn advance(
        &self,
        session_id: &str,
        input: &OracleInput,
    ) -> Result<OracleReply, OracleError> {
        (**self).advance(session_id, input).await
    }
}

/// Logging wrapper for oracle clients
pub struct LoggingOracle {
    inner: Arc<dyn OracleClient>,
}

impl LoggingOracle {
    pub fn new(inner: Arc<dyn OracleClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl OracleClient for LoggingOracle {
    async fn initialize(&self, session_id: &str) -> Result<InitialSnapshot, OracleError> {
        let start = std::time::Instant::now();
        let result = self.inner.initialize(session_id).await;
        let duration = start.elapsed();

        match &result {
            Ok(snapshot) => {
                tracing::info!(
                    session_id = %session_id,
                    duration_ms = %duration.as_millis(),
                    history_len = snapshot.history.len(),
                    options = snapshot.options.len(),
                    "Oracle initialize completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Oracle initialize failed"
                );
            }
        }

        result
    }

    async fn advance(
        &self,
        session_id: &str,
        input: &OracleInput,
    ) -> Result<OracleReply, OracleError> {
        let start = std::time::Instant::now();
        let result = self.inner.advance(session_id, input).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    session_id = %session_id,
                    duration_ms = %duration.as_millis(),
                    reply_chars = reply.next_reply.chars().count(),
                    options = reply.options.len(),
                    "Oracle advance completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Oracle advance failed"
                );
            }
        }

        result
    }
}
