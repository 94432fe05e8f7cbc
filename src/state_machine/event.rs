//! Events that can occur in a session

use crate::oracle::{InitialSnapshot, OracleReply};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Lifecycle
    InitRequested,
    InitLoaded {
        snapshot: InitialSnapshot,
    },
    InitFailed {
        message: String,
    },

    // User events
    UserText {
        text: String,
    },
    OptionSelected {
        option: String,
    },

    // Oracle events
    OracleReplied {
        reply: OracleReply,
    },
    OracleFailed {
        message: String,
    },

    // Reveal events
    RevealProgress {
        prefix: String,
    },
    RevealFinished,
}
