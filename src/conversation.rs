//! Conversation data model
//!
//! Transcript turns, the structured itinerary record, and the observable
//! per-session snapshot handed to the presentation layer.

use crate::completeness;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The itinerary record being filled in by the oracle.
///
/// Field names are the oracle's own (`Origin_city`, `time_schedule`, ...);
/// values may be arbitrarily nested.
pub type Record = Map<String, Value>;

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    /// Prefix used by the transcript wire encoding
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Bot => "Bot",
        }
    }
}

/// One message in transcript order. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
        }
    }

    /// Encode as a `"User: ..."` / `"Bot: ..."` transcript line
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.speaker.label(), self.text)
    }

    /// Decode a transcript line.
    ///
    /// The prefix match is case-insensitive. Lines without a recognised
    /// prefix are kept whole and attributed to the user.
    pub fn from_line(line: &str) -> Self {
        if let Some((prefix, rest)) = line.split_once(':') {
            let text = rest.strip_prefix(' ').unwrap_or(rest);
            if prefix.eq_ignore_ascii_case("user") {
                return Self::user(text);
            }
            if prefix.eq_ignore_ascii_case("bot") {
                return Self::bot(text);
            }
        }
        Self::user(line)
    }
}

impl fmt::Display for ChatTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker.label(), self.text)
    }
}

/// Read-only snapshot of one session, as published to observers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationState {
    pub session_id: String,
    /// Authoritative transcript. Bot turns land here only once fully revealed.
    pub history: Vec<ChatTurn>,
    /// Last record returned by the oracle. `None` until initialized.
    pub structured_record: Option<Record>,
    pub pending_options: Vec<String>,
    /// Derived from `structured_record`; recomputed on every replacement.
    pub is_complete: bool,
    /// An `initialize` or `advance` call is in flight
    pub loading: bool,
    /// Prefix of the bot reply currently being revealed
    pub revealing: Option<String>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.structured_record.is_some()
    }

    /// Neither waiting on the oracle nor animating a reply
    pub fn is_settled(&self) -> bool {
        !self.loading && self.revealing.is_none()
    }

    /// The record as indented JSON, followed by a completeness verdict and,
    /// while incomplete, the fields still missing
    pub fn record_report(&self) -> String {
        let Some(record) = &self.structured_record else {
            return "No itinerary data yet.".to_string();
        };

        let mut lines = vec![serde_json::to_string_pretty(record)
            .unwrap_or_else(|e| format!("<unprintable record: {e}>"))];
        if self.is_complete {
            lines.push("I have enough data to work with!".to_string());
        } else {
            lines.push("Please fill in all the required fields.".to_string());
            lines.push(format!(
                "Missing: {}",
                completeness::missing_fields(record).join(", ")
            ));
        }
        lines.join("\n")
    }
}
