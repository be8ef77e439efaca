//! Live reconciliation of pushed notifications into the cache.
//!
//! One spawned task owns the feed subscription. It applies every delivered
//! notification to the [`NotificationCache`], reconnects with jittered
//! exponential backoff when the channel drops, and stops on cancellation or
//! when the channel rejects the session.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::notification_cache::{NotificationCache, NotificationView, PushOutcome};
use super::ports::{FeedError, NotificationFeed, NotificationStream};
use super::{Notification, NotificationId};

mod runtime;

pub use runtime::{BackoffJitter, RandomJitter, ReconcilerRuntime, ReconnectSleeper, TokioSleeper};

/// Reconnect backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect; also the minimum delay.
    pub initial_backoff: Duration,
    /// Cap for the exponential delay.
    pub max_backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Un-jittered delay before reconnect `attempt` (1-based).
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(
            base_ms
                .saturating_mul(u64::from(exponent))
                .min(max_ms.max(base_ms)),
        )
    }
}

/// Connection state of the push subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// Opening a subscription.
    Connecting,
    /// Receiving pushes.
    Connected,
    /// Waiting to reconnect.
    Disconnected,
    /// The channel rejected the session; the task has ended.
    SessionExpired,
    /// Cancelled; the task has ended.
    Stopped,
}

impl FeedState {
    /// Whether the reconciler task has ended.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::SessionExpired | Self::Stopped)
    }
}

/// Applies a notification feed to a cache.
pub struct NotificationReconciler {
    feed: Arc<dyn NotificationFeed>,
    cache: NotificationCache,
    policy: ReconnectPolicy,
    runtime: ReconcilerRuntime,
}

enum Drained {
    Cancelled,
    Ended { delivered: bool },
    Failed { delivered: bool, error: FeedError },
    Unauthorized(FeedError),
}

impl NotificationReconciler {
    /// Build a reconciler with default sleep, jitter and clock.
    pub fn new(
        feed: Arc<dyn NotificationFeed>,
        cache: NotificationCache,
        policy: ReconnectPolicy,
    ) -> Self {
        Self::with_runtime(feed, cache, policy, ReconcilerRuntime::default())
    }

    /// Build a reconciler with injected runtime seams.
    pub fn with_runtime(
        feed: Arc<dyn NotificationFeed>,
        cache: NotificationCache,
        policy: ReconnectPolicy,
        runtime: ReconcilerRuntime,
    ) -> Self {
        Self {
            feed,
            cache,
            policy,
            runtime,
        }
    }

    /// Start the subscription task.
    ///
    /// `on_update` runs on the task after every applied notification. It never
    /// runs once [`ReconcilerHandle::cancel`] has returned.
    pub fn spawn<F>(self, on_update: F) -> ReconcilerHandle
    where
        F: FnMut(NotificationView) + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(FeedState::Connecting);
        let task = tokio::spawn(self.run(on_update, cancel_rx, state_tx));
        ReconcilerHandle {
            cancel: cancel_tx,
            state: state_rx,
            task: Some(task),
        }
    }

    async fn run<F>(
        self,
        mut on_update: F,
        mut cancel: watch::Receiver<bool>,
        state: watch::Sender<FeedState>,
    ) where
        F: FnMut(NotificationView) + Send + 'static,
    {
        let mut cursor: Option<NotificationId> = None;
        let mut attempt: u32 = 0;

        loop {
            state.send_replace(FeedState::Connecting);
            let connected = tokio::select! {
                biased;
                () = cancelled(&mut cancel) => break,
                result = self.feed.connect(cursor.as_ref()) => result,
            };

            let outcome = match connected {
                Ok(mut stream) => {
                    state.send_replace(FeedState::Connected);
                    tracing::info!(resume_after = ?cursor, "notification feed connected");
                    self.drain(&mut stream, &mut on_update, &mut cursor, &mut cancel)
                        .await
                }
                Err(error @ FeedError::Unauthorized { .. }) => Drained::Unauthorized(error),
                Err(error) => Drained::Failed {
                    delivered: false,
                    error,
                },
            };

            match outcome {
                Drained::Cancelled => break,
                Drained::Unauthorized(error) => {
                    tracing::warn!(%error, "notification feed rejected session");
                    state.send_replace(FeedState::SessionExpired);
                    return;
                }
                Drained::Ended { delivered } => {
                    tracing::info!("notification feed closed by server");
                    if delivered {
                        attempt = 0;
                    }
                }
                Drained::Failed { delivered, error } => {
                    tracing::warn!(kind = error.kind(), %error, "notification feed failed");
                    if delivered {
                        attempt = 0;
                    }
                }
            }

            state.send_replace(FeedState::Disconnected);
            attempt = attempt.saturating_add(1);
            let delay = self.reconnect_delay(attempt);
            tracing::debug!(
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "reconnecting notification feed"
            );
            tokio::select! {
                biased;
                () = cancelled(&mut cancel) => break,
                () = self.runtime.sleeper.sleep(delay) => {}
            }
        }

        state.send_replace(FeedState::Stopped);
        tracing::debug!("notification reconciler stopped");
    }

    async fn drain<F>(
        &self,
        stream: &mut NotificationStream,
        on_update: &mut F,
        cursor: &mut Option<NotificationId>,
        cancel: &mut watch::Receiver<bool>,
    ) -> Drained
    where
        F: FnMut(NotificationView) + Send + 'static,
    {
        let mut delivered = false;
        loop {
            let next = tokio::select! {
                biased;
                () = cancelled(cancel) => return Drained::Cancelled,
                next = stream.next() => next,
            };
            match next {
                None => return Drained::Ended { delivered },
                Some(Ok(notification)) => {
                    delivered = true;
                    self.apply(notification, on_update, cursor);
                }
                Some(Err(error)) if error.is_message_local() => {
                    tracing::warn!(%error, "skipping malformed push message");
                }
                Some(Err(error @ FeedError::Unauthorized { .. })) => {
                    return Drained::Unauthorized(error);
                }
                Some(Err(error)) => return Drained::Failed { delivered, error },
            }
        }
    }

    fn apply<F>(
        &self,
        notification: Notification,
        on_update: &mut F,
        cursor: &mut Option<NotificationId>,
    ) where
        F: FnMut(NotificationView),
    {
        let id = notification.id.clone();
        match self.cache.apply_push(notification) {
            Ok((PushOutcome::Inserted, view)) => {
                tracing::debug!(notification_id = %id, unread = view.unread_count, "push applied");
                *cursor = Some(id);
                on_update(view);
            }
            Ok((PushOutcome::Duplicate, _)) => {
                tracing::debug!(notification_id = %id, "duplicate push ignored");
                *cursor = Some(id);
            }
            Err(error) => {
                tracing::error!(notification_id = %id, %error, "push dropped");
            }
        }
    }

    fn reconnect_delay(&self, attempt: u32) -> Duration {
        let base = self.policy.base_delay(attempt);
        self.runtime
            .jitter
            .jittered_delay(base, attempt, self.runtime.clock.utc())
            .max(self.policy.initial_backoff)
    }
}

/// Resolves once cancellation is requested or the handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    // A dropped sender also ends the wait.
    let _ = cancel.wait_for(|requested| *requested).await;
}

/// Owner of a running reconciler task.
///
/// Dropping the handle requests cancellation without waiting for it.
#[derive(Debug)]
pub struct ReconcilerHandle {
    cancel: watch::Sender<bool>,
    state: watch::Receiver<FeedState>,
    task: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Latest connection state.
    #[must_use]
    pub fn state(&self) -> FeedState {
        *self.state.borrow()
    }

    /// Receiver observing every connection-state change.
    #[must_use]
    pub fn state_updates(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Stop the task and wait until it has finished.
    pub async fn cancel(mut self) {
        self.cancel.send_replace(true);
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(error) = task.await {
            tracing::error!(%error, "notification reconciler task failed");
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}
