//! Travel planner conversation controller
//!
//! Drives a travel-planning chat against a remote oracle that owns the
//! dialogue logic. Each session keeps an authoritative transcript and the
//! oracle's structured itinerary record, reveals replies progressively,
//! and reports when the itinerary is complete.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod completeness;
pub mod config;
pub mod conversation;
pub mod error;
pub mod oracle;
pub mod reveal;
pub mod runtime;
pub mod state_machine;

pub use config::ClientConfig;
pub use conversation::{ChatTurn, ConversationState, Record, Speaker};
pub use error::ConversationError;
pub use oracle::{HttpOracleClient, LoggingOracle, OracleClient, OracleError, OracleErrorKind};
pub use runtime::{ConversationStore, HttpConversationStore, SessionEvent};
