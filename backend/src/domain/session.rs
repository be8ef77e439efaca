//! In-process session holder implementing [`AuthContext`].
//!
//! Adapters read the bearer token from here before every request and report
//! rejections back. Rejections clear the token and are broadcast so the host
//! application can route the member to sign-in.

use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::domain::ports::{AuthContext, BearerToken, SessionInvalidated};

const SESSION_EVENT_CAPACITY: usize = 16;

/// Shared session state.
#[derive(Debug)]
pub struct SessionState {
    token: RwLock<Option<BearerToken>>,
    events: broadcast::Sender<SessionInvalidated>,
}

impl SessionState {
    /// Start a session, optionally already signed in.
    #[must_use]
    pub fn new(token: Option<BearerToken>) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            token: RwLock::new(token),
            events,
        }
    }

    /// Replace the current token, for example after a fresh sign-in.
    pub fn sign_in(&self, token: BearerToken) {
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
    }

    /// Whether a token is currently held.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// Receive every future [`SessionInvalidated`] event.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionInvalidated> {
        self.events.subscribe()
    }
}

impl AuthContext for SessionState {
    fn bearer_token(&self) -> Option<BearerToken> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn invalidate(&self, event: SessionInvalidated) {
        let previous = match self.token.write() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        tracing::warn!(
            rejected_by = ?event.rejected_by,
            had_token = previous.is_some(),
            "session invalidated by upstream"
        );
        // No subscribers is fine: nobody is listening for sign-in prompts.
        let _ = self.events.send(event);
    }
}
