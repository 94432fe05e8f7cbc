//! Typing reveal animation
//!
//! Exposes ever-longer prefixes of a message at a fixed interval. A new
//! reveal supersedes the one in progress, so two messages' prefixes never
//! interleave.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay between reveal steps when none is configured
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(50);

/// How a reveal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Every prefix up to the full text was shown
    Completed,
    /// A newer reveal (or an explicit cancel) took over
    Superseded,
}

/// Prefixes shown by a reveal, on char boundaries.
///
/// `"Hi"` yields `""`, `"H"`, `"Hi"`; the empty string yields nothing.
pub fn prefixes(text: &str) -> impl Iterator<Item = &str> + '_ {
    let ends = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .filter(move |_| !text.is_empty());
    ends.map(move |end| text.split_at(end).0)
}

/// Cooperative, supersedable reveal scheduler. One per session.
#[derive(Debug)]
pub struct RevealScheduler {
    delay: Duration,
    next_id: AtomicU64,
    active: Mutex<Option<(u64, CancellationToken)>>,
}

impl RevealScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_id: AtomicU64::new(1),
            active: Mutex::new(None),
        }
    }

    /// Whether a reveal is currently running
    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Abandon the running reveal, if any
    pub fn cancel(&self) {
        if let Some((_, token)) = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }

    /// Reveal `text`, awaiting `on_step` for each prefix.
    ///
    /// Yields to the runtime between steps. Returns `Superseded` as soon as
    /// another reveal starts on this scheduler.
    pub async fn reveal<F, Fut>(&self, text: &str, mut on_step: F) -> RevealOutcome
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        let (id, token) = self.supersede();

        for prefix in prefixes(text) {
            if token.is_cancelled() {
                return RevealOutcome::Superseded;
            }
            on_step(prefix.to_string()).await;
            tokio::select! {
                () = token.cancelled() => return RevealOutcome::Superseded,
                () = tokio::time::sleep(self.delay) => {}
            }
        }

        self.finish(id);
        if token.is_cancelled() {
            RevealOutcome::Superseded
        } else {
            RevealOutcome::Completed
        }
    }

    fn supersede(&self) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((id, token.clone()));
        if let Some((prev_id, prev)) = previous {
            tracing::debug!(superseded = prev_id, by = id, "Superseding reveal");
            prev.cancel();
        }
        (id, token)
    }

    fn finish(&self, id: u64) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|(current, _)| *current == id) {
            *active = None;
        }
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_DELAY)
    }
}
