//! Store-facing error types

use crate::state_machine::TransitionError;
use thiserror::Error;

/// Errors surfaced by [`crate::ConversationStore`].
///
/// Oracle failures during a turn are not here: they are recovered inside
/// the session with an apology turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("initialization failed: {0}")]
    Initialization(String),
    #[error("session is busy, wait for the current turn to finish")]
    Busy,
    #[error("session has not been initialized")]
    NotInitialized,
    #[error("session runtime stopped: {0}")]
    SessionClosed(String),
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

impl From<TransitionError> for ConversationError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Busy => ConversationError::Busy,
            TransitionError::NotInitialized => ConversationError::NotInitialized,
            TransitionError::InvalidTransition(msg) => ConversationError::InvalidTransition(msg),
        }
    }
}
