//! Oracle request/response types
//!
//! Domain-side values handed to the controller, plus the JSON shapes used on
//! the `/api/initialize` and `/api/chat` endpoints.

use super::OracleError;
use crate::conversation::{ChatTurn, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Domain types
// ============================================================================

/// What the controller sends on `advance`
#[derive(Debug, Clone, PartialEq)]
pub enum OracleInput {
    /// Raw free text, exactly as typed
    Text(String),
    /// The whole transcript so far, newest turn last
    Transcript(Vec<ChatTurn>),
}

impl OracleInput {
    pub fn to_wire(&self) -> UserInput {
        match self {
            OracleInput::Text(text) => UserInput::Text(text.clone()),
            OracleInput::Transcript(turns) => {
                UserInput::Transcript(turns.iter().map(ChatTurn::to_line).collect())
            }
        }
    }
}

/// Session state returned by `initialize`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InitialSnapshot {
    pub history: Vec<ChatTurn>,
    pub record: Record,
    pub options: Vec<String>,
}

/// Oracle answer to one `advance` call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OracleReply {
    pub next_reply: String,
    pub record: Record,
    pub options: Vec<String>,
}

// ============================================================================
// Wire types
// ============================================================================

/// Body of `POST /api/initialize`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    pub session_id: String,
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_input: UserInput,
    pub session_id: String,
}

/// `userInput` is either a plain string or a list of transcript lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserInput {
    Text(String),
    Transcript(Vec<String>),
}

/// Response of `POST /api/initialize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializeResponse {
    pub current_json: Option<Value>,
    pub chat_history: Option<Vec<String>>,
    pub options: Option<Vec<String>>,
}

/// Response of `POST /api/chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub current_json: Option<Value>,
    pub next_reply: Option<String>,
    pub options: Option<Vec<String>>,
}

/// `current_json` must be an object; anything else would wipe the record
fn into_record(current_json: Option<Value>) -> Result<Record, OracleError> {
    match current_json {
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(OracleError::decode(format!(
            "current_json is not an object: {other}"
        ))),
        None => Err(OracleError::decode("response is missing current_json")),
    }
}

impl TryFrom<InitializeResponse> for InitialSnapshot {
    type Error = OracleError;

    fn try_from(response: InitializeResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            record: into_record(response.current_json)?,
            history: response
                .chat_history
                .unwrap_or_default()
                .iter()
                .map(|line| ChatTurn::from_line(line))
                .collect(),
            options: response.options.unwrap_or_default(),
        })
    }
}

impl TryFrom<ChatResponse> for OracleReply {
    type Error = OracleError;

    fn try_from(response: ChatResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            record: into_record(response.current_json)?,
            next_reply: response.next_reply.unwrap_or_default(),
            options: response.options.unwrap_or_default(),
        })
    }
}
