//! Pure state transition function

use super::{ConvContext, ConvState, Effect, Event, InputMode, Notice};
use thiserror::Error;

/// Bot turn synthesized when `advance` fails
pub const APOLOGY_MESSAGE: &str = "I'm sorry, I couldn't process your request. Please try again.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Session is busy, wait for the current turn to finish")]
    Busy,
    #[error("Session has not been initialized")]
    NotInitialized,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Empty input is ignored from every phase
        // ============================================================
        (_, Event::UserText { text } | Event::OptionSelected { option: text })
            if text.trim().is_empty() =>
        {
            Ok(TransitionResult::new(state.clone()))
        }

        // ============================================================
        // Initialization
        // ============================================================
        (ConvState::Uninitialized, Event::InitRequested) => Ok(TransitionResult::new(
            ConvState::Initializing { refresh: false },
        )
        .with_effect(Effect::FetchInitial)),

        (ConvState::Idle, Event::InitRequested) => Ok(TransitionResult::new(
            ConvState::Initializing { refresh: true },
        )
        .with_effect(Effect::FetchInitial)),

        (ConvState::Initializing { .. }, Event::InitLoaded { snapshot }) => {
            Ok(TransitionResult::new(ConvState::Idle).with_effects([
                Effect::ReplaceHistory {
                    history: snapshot.history,
                },
                Effect::ReplaceRecord {
                    record: snapshot.record,
                },
                Effect::ReplaceOptions {
                    options: snapshot.options,
                },
                Effect::notify(Notice::Initialized),
            ]))
        }

        // A failed refresh keeps the loaded snapshot usable
        (ConvState::Initializing { refresh }, Event::InitFailed { message }) => {
            let next = if *refresh {
                ConvState::Idle
            } else {
                ConvState::Uninitialized
            };
            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify(Notice::InitializationFailed { message })))
        }

        // ============================================================
        // User input: optimistic append, then ask the oracle
        // ============================================================
        (ConvState::Idle, Event::UserText { text }) => {
            Ok(TransitionResult::new(ConvState::AwaitingOracle).with_effects([
                Effect::append_user(text.clone()),
                Effect::ClearOptions,
                Effect::RequestOracle {
                    input: InputMode::Raw(text),
                },
                Effect::notify(Notice::TurnStarted),
            ]))
        }

        // Options are cleared first so they cannot be selected twice; the
        // oracle gets the whole transcript including this turn
        (ConvState::Idle, Event::OptionSelected { option }) => {
            Ok(TransitionResult::new(ConvState::AwaitingOracle).with_effects([
                Effect::ClearOptions,
                Effect::append_user(option),
                Effect::RequestOracle {
                    input: InputMode::FullTranscript,
                },
                Effect::notify(Notice::TurnStarted),
            ]))
        }

        (
            ConvState::Initializing { .. } | ConvState::AwaitingOracle | ConvState::Revealing { .. },
            Event::UserText { .. } | Event::OptionSelected { .. } | Event::InitRequested,
        ) => Err(TransitionError::Busy),

        (ConvState::Uninitialized, Event::UserText { .. } | Event::OptionSelected { .. }) => {
            Err(TransitionError::NotInitialized)
        }

        // ============================================================
        // Oracle responses
        // ============================================================

        // The reply is held in the phase until the reveal completes, so the
        // transcript never contains a partially revealed turn
        (ConvState::AwaitingOracle, Event::OracleReplied { reply }) => {
            let text = reply.next_reply.clone();
            Ok(TransitionResult::new(ConvState::Revealing { reply })
                .with_effect(Effect::StartReveal { text }))
        }

        // Fallback: record untouched, options cleared, user turn kept
        (ConvState::AwaitingOracle, Event::OracleFailed { message }) => {
            Ok(TransitionResult::new(ConvState::Idle).with_effects([
                Effect::ClearOptions,
                Effect::append_bot(APOLOGY_MESSAGE),
                Effect::notify(Notice::OracleFallback { message }),
            ]))
        }

        // ============================================================
        // Reveal
        // ============================================================
        (ConvState::Revealing { reply }, Event::RevealProgress { prefix }) => {
            Ok(TransitionResult::new(ConvState::Revealing {
                reply: reply.clone(),
            })
            .with_effect(Effect::ShowRevealPrefix { prefix }))
        }

        (ConvState::Revealing { reply }, Event::RevealFinished) => {
            let reply = reply.clone();
            Ok(TransitionResult::new(ConvState::Idle).with_effects([
                Effect::append_bot(reply.next_reply),
                Effect::ReplaceRecord {
                    record: reply.record,
                },
                Effect::ReplaceOptions {
                    options: reply.options,
                },
                Effect::notify(Notice::TurnCompleted),
            ]))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "session {}: no transition from {} with event {:?}",
            context.session_id,
            state.name(),
            event
        ))),
    }
}
