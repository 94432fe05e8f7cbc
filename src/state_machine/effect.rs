//! Effects produced by state transitions

use crate::conversation::{ChatTurn, Record};

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call the oracle's `initialize`
    FetchInitial,

    /// Append a turn to the transcript
    AppendTurn { turn: ChatTurn },

    /// Replace the whole transcript (initial load)
    ReplaceHistory { history: Vec<ChatTurn> },

    /// Replace the structured record wholesale. Completeness is re-derived
    /// by the executor as part of applying this effect.
    ReplaceRecord { record: Record },

    ReplaceOptions { options: Vec<String> },

    ClearOptions,

    /// Call the oracle's `advance`
    RequestOracle { input: InputMode },

    /// Begin animating a reply
    StartReveal { text: String },

    /// Show the next revealed prefix
    ShowRevealPrefix { prefix: String },

    /// Tell observers something happened
    Notify { notice: Notice },
}

/// What to send on `advance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// The raw submitted text
    Raw(String),
    /// The full transcript, including the turn just appended
    FullTranscript,
}

/// Discrete notifications raised by transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Initialized,
    InitializationFailed { message: String },
    TurnStarted,
    TurnCompleted,
    OracleFallback { message: String },
}

impl Effect {
    pub fn append_user(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: ChatTurn::user(text),
        }
    }

    pub fn append_bot(text: impl Into<String>) -> Self {
        Effect::AppendTurn {
            turn: ChatTurn::bot(text),
        }
    }

    pub fn notify(notice: Notice) -> Self {
        Effect::Notify { notice }
    }
}
