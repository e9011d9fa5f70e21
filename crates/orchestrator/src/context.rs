//! Execution context shared by a caller, the orchestrator and its workers.

use events::EventBus;
use tokio_util::sync::CancellationToken;

/// Cancellation scope plus the event sink for a run.
///
/// Cloning shares the same cancellation state. [`RunContext::child`] derives
/// a context that is cancelled with its parent but can also be cancelled on
/// its own without touching the parent.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    token: CancellationToken,
    events: Option<EventBus>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. one cancelled by a signal handler.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            events: None,
        }
    }

    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            events: self.events.clone(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }
}
