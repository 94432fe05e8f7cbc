//! HTTP oracle client
//!
//! JSON over `POST /api/initialize` and `POST /api/chat`. One attempt per
//! call; the controller owns the fallback.

use super::types::{
    ChatRequest, ChatResponse, InitialSnapshot, InitializeRequest, InitializeResponse,
    OracleInput, OracleReply,
};
use super::{OracleClient, OracleError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Oracle reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpOracleClient {
    client: Client,
    base_url: String,
}

impl HttpOracleClient {
    /// Build a client for `base_url`. `timeout` of `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, OracleError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| OracleError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, OracleError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    OracleError::network(format!("Connection failed: {e}"))
                } else {
                    OracleError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| OracleError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(OracleError::status(
                status.as_u16(),
                format!("HTTP {status}: {text}"),
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| OracleError::decode(format!("Failed to parse response: {e} - body: {text}")))
    }
}

#[async_trait]
impl OracleClient for HttpOracleClient {
    async fn initialize(&self, session_id: &str) -> Result<InitialSnapshot, OracleError> {
        let request = InitializeRequest {
            session_id: session_id.to_string(),
        };
        let response: InitializeResponse = self.post("/api/initialize", &request).await?;
        InitialSnapshot::try_from(response)
    }

    async fn advance(
        &self,
        session_id: &str,
        input: &OracleInput,
    ) -> Result<OracleReply, OracleError> {
        let request = ChatRequest {
            user_input: input.to_wire(),
            session_id: session_id.to_string(),
        };
        let response: ChatResponse = self.post("/api/chat", &request).await?;
        OracleReply::try_from(response)
    }
}
