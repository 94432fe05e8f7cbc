//! Conversation store
//!
//! Keys sessions by id and runs one [`SessionRuntime`] per session. Sessions
//! are independent; each is single-writer.

mod executor;


pub use executor::SessionRuntime;

use crate::conversation::ConversationState;
use crate::error::ConversationError;
use crate::oracle::{HttpOracleClient, LoggingOracle, OracleClient};
use crate::reveal::RevealScheduler;
use crate::state_machine::{ConvContext, Event};
use crate::ClientConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};
use tracing::Instrument;

/// Store backed by the HTTP oracle
pub type HttpConversationStore = ConversationStore<LoggingOracle>;

/// Commands delivered to a session runtime
#[derive(Debug)]
pub(crate) enum SessionCommand {
    /// Caller-initiated event, acknowledged once applied
    Request {
        event: Event,
        ack: oneshot::Sender<Result<ConversationState, ConversationError>>,
    },
    /// Outcome of a spawned oracle call
    Oracle(Event),
    /// Progress of a spawned reveal
    Reveal { reveal_id: u64, event: Event },
}

/// Notifications for observers of one session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Initialized,
    InitializationFailed { message: String },
    /// User turn appended, oracle call dispatched
    TurnStarted,
    RevealStep { prefix: String },
    /// Bot turn committed and record replaced
    TurnCompleted { is_complete: bool },
    /// The oracle call failed and an apology was appended
    OracleFallback { message: String },
    /// A request was refused (busy, not initialized)
    Rejected { reason: String },
}

/// Handle to interact with a running session
#[derive(Clone)]
struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<ConversationState>,
    events_tx: broadcast::Sender<SessionEvent>,
}

/// Manager for all session runtimes
pub struct ConversationStore<C>
where
    C: OracleClient + 'static,
{
    oracle: Arc<C>,
    reveal_delay: Duration,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl HttpConversationStore {
    /// Build a store talking to the configured HTTP oracle
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConversationError> {
        let client = HttpOracleClient::new(&config.oracle_base_url, config.request_timeout)
            .map_err(|e| ConversationError::Initialization(e.to_string()))?;
        Ok(Self::new(
            LoggingOracle::new(Arc::new(client)),
            config.reveal_delay,
        ))
    }
}

impl<C> ConversationStore<C>
where
    C: OracleClient + 'static,
{
    pub fn new(oracle: C, reveal_delay: Duration) -> Self {
        Self {
            oracle: Arc::new(oracle),
            reveal_delay,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Load the session's state from the oracle.
    ///
    /// Resolves once the snapshot is in place, or with
    /// [`ConversationError::Initialization`] if the oracle call failed.
    pub async fn initialize(&self, session_id: &str) -> Result<ConversationState, ConversationError> {
        self.request(session_id, Event::InitRequested).await
    }

    /// Submit free text. Blank text is ignored without touching the session.
    ///
    /// Returns once the user turn is appended; the reply arrives later.
    pub async fn submit_text(&self, session_id: &str, text: &str) -> Result<(), ConversationError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.request(
            session_id,
            Event::UserText {
                text: text.to_string(),
            },
        )
        .await
        .map(|_| ())
    }

    /// Select a suggested option. The oracle receives the full transcript.
    pub async fn select_option(
        &self,
        session_id: &str,
        option: &str,
    ) -> Result<(), ConversationError> {
        if option.trim().is_empty() {
            return Ok(());
        }
        self.request(
            session_id,
            Event::OptionSelected {
                option: option.to_string(),
            },
        )
        .await
        .map(|_| ())
    }

    /// Current snapshot, if the session exists
    pub async fn get_state(&self, session_id: &str) -> Option<ConversationState> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|handle| handle.state_rx.borrow().clone())
    }

    /// Receiver that changes whenever the session's snapshot does
    pub async fn watch(&self, session_id: &str) -> watch::Receiver<ConversationState> {
        self.get_or_create(session_id).await.state_rx
    }

    /// Subscribe to session notifications
    pub async fn subscribe(&self, session_id: &str) -> broadcast::Receiver<SessionEvent> {
        self.get_or_create(session_id).await.events_tx.subscribe()
    }

    /// Wait until the session is neither loading nor revealing
    pub async fn settled(&self, session_id: &str) -> Result<ConversationState, ConversationError> {
        let mut state_rx = self.watch(session_id).await;
        let state = state_rx
            .wait_for(ConversationState::is_settled)
            .await
            .map_err(|_| ConversationError::SessionClosed(session_id.to_string()))?;
        Ok(state.clone())
    }

    /// Ids of all live sessions
    pub async fn session_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    async fn request(
        &self,
        session_id: &str,
        event: Event,
    ) -> Result<ConversationState, ConversationError> {
        let handle = self.get_or_create(session_id).await;
        let (ack_tx, ack_rx) = oneshot::channel();

        handle
            .command_tx
            .send(SessionCommand::Request { event, ack: ack_tx })
            .await
            .map_err(|_| ConversationError::SessionClosed(session_id.to_string()))?;

        ack_rx
            .await
            .map_err(|_| ConversationError::SessionClosed(session_id.to_string()))?
    }

    /// Get or create the runtime for a session
    async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        // Check if already running
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(session_id) {
                return handle.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        if let Some(handle) = sessions.get(session_id) {
            return handle.clone();
        }

        let context = ConvContext::new(session_id);
        let (command_tx, command_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(ConversationState::new(session_id));
        let (events_tx, _) = broadcast::channel(256);

        let runtime = SessionRuntime::new(
            context,
            self.oracle.clone(),
            Arc::new(RevealScheduler::new(self.reveal_delay)),
            command_rx,
            &command_tx,
            state_tx,
            events_tx.clone(),
        );

        let span = tracing::info_span!("session", session_id = %session_id);
        tokio::spawn(runtime.run().instrument(span));

        let handle = SessionHandle {
            command_tx,
            state_rx,
            events_tx,
        };
        sessions.insert(session_id.to_string(), handle.clone());
        handle
    }
}
