//! Per-session runtime executor
//!
//! Owns one session's phase and snapshot. Commands arrive on a channel;
//! oracle calls and reveals run as spawned tasks that post their outcome
//! back, so every mutation happens on this task.

use super::{SessionCommand, SessionEvent};
use crate::completeness;
use crate::conversation::ConversationState;
use crate::error::ConversationError;
use crate::oracle::{OracleClient, OracleInput};
use crate::reveal::{RevealOutcome, RevealScheduler};
use crate::state_machine::{
    transition, ConvContext, ConvState, Effect, Event, InputMode, Notice, TransitionError,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

type Ack = oneshot::Sender<Result<ConversationState, ConversationError>>;

/// Single-writer runtime for one session
pub struct SessionRuntime<C>
where
    C: OracleClient + 'static,
{
    context: ConvContext,
    state: ConvState,
    snapshot: ConversationState,
    oracle: Arc<C>,
    scheduler: Arc<RevealScheduler>,
    command_rx: mpsc::Receiver<SessionCommand>,
    /// Weak so the loop ends once the store drops its handle
    command_tx: mpsc::WeakSender<SessionCommand>,
    state_tx: watch::Sender<ConversationState>,
    events_tx: broadcast::Sender<SessionEvent>,
    /// Reveal whose events are still accepted
    active_reveal: Option<u64>,
    next_reveal_id: u64,
    /// Callers of `initialize` waiting for the snapshot
    init_waiters: Vec<Ack>,
}

impl<C> SessionRuntime<C>
where
    C: OracleClient + 'static,
{
    pub(crate) fn new(
        context: ConvContext,
        oracle: Arc<C>,
        scheduler: Arc<RevealScheduler>,
        command_rx: mpsc::Receiver<SessionCommand>,
        command_tx: &mpsc::Sender<SessionCommand>,
        state_tx: watch::Sender<ConversationState>,
        events_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let snapshot = ConversationState::new(context.session_id.clone());
        Self {
            context,
            state: ConvState::default(),
            snapshot,
            oracle,
            scheduler,
            command_rx,
            command_tx: command_tx.downgrade(),
            state_tx,
            events_tx,
            active_reveal: None,
            next_reveal_id: 0,
            init_waiters: Vec::new(),
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command);
        }

        self.scheduler.cancel();
        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Request { event, ack } => {
                let deferred = matches!(event, Event::InitRequested);
                match self.process_event(event) {
                    Ok(()) if deferred => self.init_waiters.push(ack),
                    Ok(()) => {
                        let _ = ack.send(Ok(self.snapshot.clone()));
                    }
                    Err(e) => {
                        tracing::debug!(
                            session_id = %self.context.session_id,
                            phase = self.state.name(),
                            error = %e,
                            "Rejected request"
                        );
                        let _ = self.events_tx.send(SessionEvent::Rejected {
                            reason: e.to_string(),
                        });
                        let _ = ack.send(Err(e.into()));
                    }
                }
            }

            SessionCommand::Oracle(event) => {
                if let Err(e) = self.process_event(event) {
                    tracing::error!(error = %e, "Error handling oracle outcome");
                }
            }

            SessionCommand::Reveal { reveal_id, event } => {
                if self.active_reveal != Some(reveal_id) {
                    tracing::debug!(reveal_id, "Dropping event from superseded reveal");
                    return;
                }
                if matches!(event, Event::RevealFinished) {
                    self.active_reveal = None;
                }
                if let Err(e) = self.process_event(event) {
                    tracing::error!(error = %e, "Error handling reveal event");
                }
            }
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // Pure state transition
        let result = transition(&self.state, &self.context, event)?;

        let old_state = std::mem::replace(&mut self.state, result.new_state);
        if old_state.name() != self.state.name() {
            tracing::debug!(
                session_id = %self.context.session_id,
                from = old_state.name(),
                to = self.state.name(),
                "Phase change"
            );
        }

        self.snapshot.loading = self.state.is_loading();
        if !self.state.is_revealing() {
            self.snapshot.revealing = None;
        }

        let mut outbox = Vec::new();
        for effect in result.effects {
            self.execute_effect(effect, &mut outbox);
        }

        // Observers see the new snapshot before the notifications about it
        self.publish();
        for event in outbox {
            self.announce(event);
        }

        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect, outbox: &mut Vec<SessionEvent>) {
        match effect {
            Effect::FetchInitial => self.spawn_initialize(),

            Effect::AppendTurn { turn } => self.snapshot.history.push(turn),

            Effect::ReplaceHistory { history } => self.snapshot.history = history,

            Effect::ReplaceRecord { record } => {
                self.snapshot.is_complete = completeness::is_complete(&record);
                tracing::debug!(
                    session_id = %self.context.session_id,
                    is_complete = self.snapshot.is_complete,
                    missing = ?completeness::missing_fields(&record),
                    "Record replaced"
                );
                self.snapshot.structured_record = Some(record);
            }

            Effect::ReplaceOptions { options } => self.snapshot.pending_options = options,

            Effect::ClearOptions => self.snapshot.pending_options.clear(),

            Effect::RequestOracle { input } => {
                let input = match input {
                    InputMode::Raw(text) => OracleInput::Text(text),
                    InputMode::FullTranscript => {
                        OracleInput::Transcript(self.snapshot.history.clone())
                    }
                };
                self.spawn_advance(input);
            }

            Effect::StartReveal { text } => self.start_reveal(text),

            Effect::ShowRevealPrefix { prefix } => {
                self.snapshot.revealing = Some(prefix.clone());
                outbox.push(SessionEvent::RevealStep { prefix });
            }

            Effect::Notify { notice } => outbox.push(match notice {
                Notice::Initialized => SessionEvent::Initialized,
                Notice::InitializationFailed { message } => {
                    SessionEvent::InitializationFailed { message }
                }
                Notice::TurnStarted => SessionEvent::TurnStarted,
                Notice::TurnCompleted => SessionEvent::TurnCompleted {
                    is_complete: self.snapshot.is_complete,
                },
                Notice::OracleFallback { message } => SessionEvent::OracleFallback { message },
            }),
        }
    }

    fn publish(&self) {
        self.state_tx.send_if_modified(|current| {
            if *current == self.snapshot {
                false
            } else {
                current.clone_from(&self.snapshot);
                true
            }
        });
    }

    fn announce(&mut self, event: SessionEvent) {
        match &event {
            SessionEvent::Initialized => {
                for waiter in self.init_waiters.drain(..) {
                    let _ = waiter.send(Ok(self.snapshot.clone()));
                }
            }
            SessionEvent::InitializationFailed { message } => {
                for waiter in self.init_waiters.drain(..) {
                    let _ = waiter.send(Err(ConversationError::Initialization(message.clone())));
                }
            }
            _ => {}
        }
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn spawn_initialize(&self) {
        let Some(tx) = self.command_tx.upgrade() else {
            tracing::warn!("Session closing, skipping initialize");
            return;
        };
        let oracle = self.oracle.clone();
        let session_id = self.context.session_id.clone();

        tokio::spawn(async move {
            let event = match oracle.initialize(&session_id).await {
                Ok(snapshot) => Event::InitLoaded { snapshot },
                Err(e) => Event::InitFailed {
                    message: e.to_string(),
                },
            };
            let _ = tx.send(SessionCommand::Oracle(event)).await;
        });
    }

    fn spawn_advance(&self, input: OracleInput) {
        let Some(tx) = self.command_tx.upgrade() else {
            tracing::warn!("Session closing, skipping advance");
            return;
        };
        let oracle = self.oracle.clone();
        let session_id = self.context.session_id.clone();

        tokio::spawn(async move {
            let event = match oracle.advance(&session_id, &input).await {
                Ok(reply) => Event::OracleReplied { reply },
                Err(e) => Event::OracleFailed {
                    message: e.to_string(),
                },
            };
            let _ = tx.send(SessionCommand::Oracle(event)).await;
        });
    }

    fn start_reveal(&mut self, text: String) {
        let Some(tx) = self.command_tx.upgrade() else {
            tracing::warn!("Session closing, skipping reveal");
            return;
        };
        self.next_reveal_id += 1;
        let reveal_id = self.next_reveal_id;
        self.active_reveal = Some(reveal_id);
        self.snapshot.revealing = Some(String::new());

        let scheduler = self.scheduler.clone();
        let step_tx = tx.clone();

        tokio::spawn(async move {
            let outcome = scheduler
                .reveal(&text, move |prefix| {
                    let tx = step_tx.clone();
                    async move {
                        let _ = tx
                            .send(SessionCommand::Reveal {
                                reveal_id,
                                event: Event::RevealProgress { prefix },
                            })
                            .await;
                    }
                })
                .await;

            if outcome == RevealOutcome::Completed {
                let _ = tx
                    .send(SessionCommand::Reveal {
                        reveal_id,
                        event: Event::RevealFinished,
                    })
                    .await;
            }
        });
    }
}
