//! Doubles for the notification feed, command and settings ports.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::mpsc;

use super::lock;
use crate::domain::ports::{
    FeedError, NotificationCommand, NotificationFeed, NotificationStream, SettingsStore,
    SettingsStoreError, UpstreamCause, UpstreamError, UpstreamResult,
};
use crate::domain::{Notification, NotificationId, NotificationSettings, Source};

/// Sender feeding a live scripted connection.
pub type LiveSender = mpsc::UnboundedSender<Result<Notification, FeedError>>;

enum ScriptedConnection {
    Reject(FeedError),
    Batch(Vec<Result<Notification, FeedError>>),
    Live(mpsc::UnboundedReceiver<Result<Notification, FeedError>>),
}

/// Feed replaying one scripted outcome per `connect` call.
///
/// Once the script is exhausted, connections stay open without delivering.
#[derive(Default)]
pub struct ScriptedFeed {
    script: Mutex<VecDeque<ScriptedConnection>>,
    resume_cursors: Mutex<Vec<Option<NotificationId>>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next connect attempt fails with `error`.
    pub fn reject_next(&self, error: FeedError) {
        self.enqueue(ScriptedConnection::Reject(error));
    }

    /// The next connection delivers `items` and then closes.
    pub fn deliver_next(&self, items: Vec<Result<Notification, FeedError>>) {
        self.enqueue(ScriptedConnection::Batch(items));
    }

    /// The next connection stays open and delivers whatever the returned
    /// sender pushes; dropping the sender closes it.
    pub fn live_next(&self) -> LiveSender {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.enqueue(ScriptedConnection::Live(receiver));
        sender
    }

    /// Resume cursor passed to every connect call so far.
    pub fn resume_cursors(&self) -> Vec<Option<NotificationId>> {
        lock(&self.resume_cursors, "resume cursors").clone()
    }

    fn enqueue(&self, connection: ScriptedConnection) {
        lock(&self.script, "feed script").push_back(connection);
    }
}

#[async_trait]
impl NotificationFeed for ScriptedFeed {
    async fn connect(
        &self,
        resume_after: Option<&NotificationId>,
    ) -> Result<NotificationStream, FeedError> {
        lock(&self.resume_cursors, "resume cursors").push(resume_after.cloned());
        let next = lock(&self.script, "feed script").pop_front();
        match next {
            Some(ScriptedConnection::Reject(error)) => Err(error),
            Some(ScriptedConnection::Batch(items)) => Ok(stream::iter(items).boxed()),
            Some(ScriptedConnection::Live(receiver)) => Ok(stream::unfold(
                receiver,
                |mut receiver| async move { receiver.recv().await.map(|item| (item, receiver)) },
            )
            .boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }
}

/// Notification command recording calls, optionally failing for some ids.
#[derive(Default)]
pub struct RecordingCommand {
    failures: HashMap<NotificationId, UpstreamCause>,
    yielding: bool,
    marked: Mutex<Vec<NotificationId>>,
    deleted: Mutex<Vec<NotificationId>>,
}

impl RecordingCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls for `id` fail with `cause`.
    #[must_use]
    pub fn failing_for(mut self, id: &str, cause: UpstreamCause) -> Self {
        self.failures.insert(NotificationId::new(id), cause);
        self
    }

    /// Every call yields to the scheduler before answering.
    #[must_use]
    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    pub fn marked(&self) -> Vec<NotificationId> {
        lock(&self.marked, "marked ids").clone()
    }

    pub fn deleted(&self) -> Vec<NotificationId> {
        lock(&self.deleted, "deleted ids").clone()
    }

    async fn outcome(&self, id: &NotificationId) -> UpstreamResult<()> {
        if self.yielding {
            tokio::task::yield_now().await;
        }
        match self.failures.get(id) {
            Some(cause) => Err(UpstreamError::new(Source::Notifications, cause.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NotificationCommand for RecordingCommand {
    async fn mark_read(&self, id: &NotificationId) -> UpstreamResult<()> {
        self.outcome(id).await?;
        lock(&self.marked, "marked ids").push(id.clone());
        Ok(())
    }

    async fn delete(&self, id: &NotificationId) -> UpstreamResult<()> {
        self.outcome(id).await?;
        lock(&self.deleted, "deleted ids").push(id.clone());
        Ok(())
    }
}

/// Settings store recording commits, optionally rejecting them.
#[derive(Default)]
pub struct RecordingSettingsStore {
    failure: Mutex<Option<SettingsStoreError>>,
    commits: Mutex<Vec<NotificationSettings>>,
}

impl RecordingSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every commit fails with `error` until [`Self::recover`] is called.
    pub fn fail_with(&self, error: SettingsStoreError) {
        *lock(&self.failure, "store failure") = Some(error);
    }

    pub fn recover(&self) {
        *lock(&self.failure, "store failure") = None;
    }

    pub fn commits(&self) -> Vec<NotificationSettings> {
        lock(&self.commits, "commits").clone()
    }
}

#[async_trait]
impl SettingsStore for RecordingSettingsStore {
    async fn commit(&self, settings: &NotificationSettings) -> Result<(), SettingsStoreError> {
        if let Some(error) = lock(&self.failure, "store failure").clone() {
            return Err(error);
        }
        lock(&self.commits, "commits").push(*settings);
        Ok(())
    }
}
