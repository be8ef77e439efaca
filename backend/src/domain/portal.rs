//! Single entry point the presentation layer talks to.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};

use super::aggregator::{AggregateError, DashboardAggregator};
use super::dashboard_service::DashboardService;
use super::lifecycle::NotificationLifecycle;
use super::notification_cache::{NotificationCache, NotificationView};
use super::ports::{
    AccountGateway, NotificationCommand, NotificationFeed, SessionInvalidated, SettingsStore,
};
use super::reconciler::{
    NotificationReconciler, ReconcilerHandle, ReconcilerRuntime, ReconnectPolicy,
};
use super::session::SessionState;
use super::{
    DashboardSnapshot, Error, FailurePolicy, NotificationId, NotificationSettings, SettingKey,
    SettingsPatch,
};

/// Ports and tuning needed to assemble an [`AccountPortal`].
pub struct PortalPorts {
    /// Upstream reads.
    pub gateway: Arc<dyn AccountGateway>,
    /// Notification mutations.
    pub command: Arc<dyn NotificationCommand>,
    /// Push channel.
    pub feed: Arc<dyn NotificationFeed>,
    /// Settings commit boundary.
    pub settings_store: Arc<dyn SettingsStore>,
    /// Session shared with the adapters.
    pub session: Arc<SessionState>,
}

/// Behavioural knobs of an [`AccountPortal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalConfig {
    /// Failure policy for aggregation cycles.
    pub policy: FailurePolicy,
    /// Time every aggregation cycle gives its sources.
    pub aggregate_deadline: Duration,
    /// Push channel reconnect bounds.
    pub reconnect: ReconnectPolicy,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::default(),
            aggregate_deadline: Duration::from_secs(3),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Facade over aggregation, notification reconciliation and lifecycle.
pub struct AccountPortal {
    dashboard: DashboardService,
    cache: NotificationCache,
    lifecycle: NotificationLifecycle,
    feed: Arc<dyn NotificationFeed>,
    reconnect: ReconnectPolicy,
    runtime: ReconcilerRuntime,
    session: Arc<SessionState>,
}

impl AccountPortal {
    /// Wire the portal with the default reconnect runtime.
    pub fn new(ports: PortalPorts, config: PortalConfig) -> Self {
        Self::with_runtime(ports, config, ReconcilerRuntime::default())
    }

    /// Wire the portal with an injected reconnect runtime.
    pub fn with_runtime(
        ports: PortalPorts,
        config: PortalConfig,
        runtime: ReconcilerRuntime,
    ) -> Self {
        let cache = NotificationCache::new();
        let aggregator = DashboardAggregator::new(ports.gateway, config.policy);
        Self {
            dashboard: DashboardService::new(aggregator, cache.clone(), config.aggregate_deadline),
            lifecycle: NotificationLifecycle::new(
                cache.clone(),
                ports.command,
                ports.settings_store,
            ),
            cache,
            feed: ports.feed,
            reconnect: config.reconnect,
            runtime,
            session: ports.session,
        }
    }

    /// Run one aggregation cycle and publish the snapshot.
    pub async fn aggregate(&self) -> Result<Arc<DashboardSnapshot>, AggregateError> {
        self.dashboard.refresh().await
    }

    /// Most recently published snapshot.
    #[must_use]
    pub fn latest_snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.dashboard.latest()
    }

    /// Receiver observing every published snapshot.
    #[must_use]
    pub fn snapshot_updates(&self) -> watch::Receiver<Option<Arc<DashboardSnapshot>>> {
        self.dashboard.subscribe()
    }

    /// Start following the push channel.
    ///
    /// `on_update` receives the cache contents after every applied push.
    pub fn subscribe_notifications<F>(&self, on_update: F) -> ReconcilerHandle
    where
        F: FnMut(NotificationView) + Send + 'static,
    {
        NotificationReconciler::with_runtime(
            self.feed.clone(),
            self.cache.clone(),
            self.reconnect,
            self.runtime.clone(),
        )
        .spawn(on_update)
    }

    /// Current notification list and unread count.
    pub fn notifications(&self) -> Result<NotificationView, Error> {
        self.cache
            .view()
            .map_err(|error| Error::internal(error.to_string()))
    }

    /// Current unread count.
    pub fn unread_count(&self) -> Result<usize, Error> {
        self.cache
            .unread_count()
            .map_err(|error| Error::internal(error.to_string()))
    }

    /// See [`NotificationLifecycle::mark_as_read`].
    pub async fn mark_as_read(&self, id: &NotificationId) -> Result<(), Error> {
        self.lifecycle.mark_as_read(id).await
    }

    /// See [`NotificationLifecycle::delete_notification`].
    pub async fn delete_notification(&self, id: &NotificationId) -> Result<(), Error> {
        self.lifecycle.delete_notification(id).await
    }

    /// Current, possibly uncommitted, notification settings.
    pub fn notification_settings(&self) -> Result<NotificationSettings, Error> {
        self.lifecycle.settings()
    }

    /// See [`NotificationLifecycle::update_settings`].
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<NotificationSettings, Error> {
        self.lifecycle.update_settings(patch)
    }

    /// See [`NotificationLifecycle::toggle_setting`].
    pub fn toggle_setting(&self, key: SettingKey) -> Result<NotificationSettings, Error> {
        self.lifecycle.toggle_setting(key)
    }

    /// Whether settings changed since the last commit.
    pub fn has_uncommitted_settings(&self) -> Result<bool, Error> {
        self.lifecycle.has_uncommitted_settings()
    }

    /// See [`NotificationLifecycle::commit_settings`].
    pub async fn commit_settings(&self) -> Result<NotificationSettings, Error> {
        self.lifecycle.commit_settings().await
    }

    /// Receive an event whenever an upstream rejects the session.
    #[must_use]
    pub fn session_events(&self) -> broadcast::Receiver<SessionInvalidated> {
        self.session.subscribe()
    }
}
