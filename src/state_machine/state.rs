//! Session phase types

use crate::oracle::OracleReply;

/// Where a session is in its turn cycle.
///
/// At most one oracle call or reveal exists per session; the busy phases
/// are the mutual-exclusion gate for new user input.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConvState {
    /// Nothing loaded yet (or the first initialize failed)
    #[default]
    Uninitialized,

    /// `initialize` in flight
    Initializing {
        /// A snapshot was already loaded; failure returns to `Idle`
        refresh: bool,
    },

    /// Ready for user input
    Idle,

    /// `advance` in flight
    AwaitingOracle,

    /// Reply received, animating it before it joins the transcript
    Revealing { reply: OracleReply },
}

impl ConvState {
    /// An oracle call is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(self, ConvState::Initializing { .. } | ConvState::AwaitingOracle)
    }

    pub fn is_revealing(&self) -> bool {
        matches!(self, ConvState::Revealing { .. })
    }

    /// New user input would be rejected
    pub fn is_busy(&self) -> bool {
        self.is_loading() || self.is_revealing()
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Uninitialized => "uninitialized",
            ConvState::Initializing { .. } => "initializing",
            ConvState::Idle => "idle",
            ConvState::AwaitingOracle => "awaiting_oracle",
            ConvState::Revealing { .. } => "revealing",
        }
    }
}

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub session_id: String,
}

impl ConvContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}
