//! Session state machine
//!
//! Pure transitions from (phase, event) to (new phase, effects). The runtime
//! executes the effects; nothing here performs I/O.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, InputMode, Notice};
pub use event::Event;
pub use state::{ConvContext, ConvState};
pub use transition::{transition, TransitionError, TransitionResult, APOLOGY_MESSAGE};
