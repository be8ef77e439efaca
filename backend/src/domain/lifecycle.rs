//! User-triggered notification state transitions.
//!
//! Mark-read and delete call the notification service first and only touch the
//! cache once it has agreed. Settings toggles are local until
//! [`NotificationLifecycle::commit_settings`] hands them to the
//! [`SettingsStore`].

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;

use super::notification_cache::{CachePoisoned, NotificationCache, ReadOutcome, RemoveOutcome};
use super::ports::{
    NotificationCommand, SettingsStore, SettingsStoreError, UpstreamCause, UpstreamError,
};
use super::{Error, NotificationId, NotificationSettings, SettingKey, SettingsPatch};

#[derive(Debug, Clone, Copy)]
struct SettingsState {
    current: NotificationSettings,
    committed: NotificationSettings,
}

/// Applies mark-read, delete and settings changes.
pub struct NotificationLifecycle {
    cache: NotificationCache,
    command: Arc<dyn NotificationCommand>,
    store: Arc<dyn SettingsStore>,
    settings: Mutex<SettingsState>,
}

impl NotificationLifecycle {
    /// Start from the default settings, treated as committed.
    pub fn new(
        cache: NotificationCache,
        command: Arc<dyn NotificationCommand>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self::with_settings(cache, command, store, NotificationSettings::default())
    }

    /// Start from previously committed `settings`.
    pub fn with_settings(
        cache: NotificationCache,
        command: Arc<dyn NotificationCommand>,
        store: Arc<dyn SettingsStore>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            cache,
            command,
            store,
            settings: Mutex::new(SettingsState {
                current: settings,
                committed: settings,
            }),
        }
    }

    /// Mark `id` as read.
    ///
    /// Already-read notifications succeed without contacting the service.
    pub async fn mark_as_read(&self, id: &NotificationId) -> Result<(), Error> {
        let cached = self.cache.get(id).map_err(poisoned)?;
        let Some(notification) = cached else {
            return Err(unknown_notification(id));
        };
        if notification.read {
            tracing::debug!(notification_id = %id, "notification already read");
            return Ok(());
        }

        self.command
            .mark_read(id)
            .await
            .map_err(|error| upstream_failure("mark notification as read", id, &error))?;

        match self.cache.mark_read(id).map_err(poisoned)? {
            ReadOutcome::Marked => {
                tracing::info!(notification_id = %id, "notification marked read");
            }
            // Removed or marked concurrently while the call was in flight.
            ReadOutcome::AlreadyRead | ReadOutcome::Missing => {
                tracing::debug!(notification_id = %id, "notification changed during mark-read");
            }
        }
        Ok(())
    }

    /// Delete `id`.
    pub async fn delete_notification(&self, id: &NotificationId) -> Result<(), Error> {
        if self.cache.get(id).map_err(poisoned)?.is_none() {
            return Err(unknown_notification(id));
        }

        self.command
            .delete(id)
            .await
            .map_err(|error| upstream_failure("delete notification", id, &error))?;

        match self.cache.remove(id).map_err(poisoned)? {
            RemoveOutcome::Removed { was_unread } => {
                tracing::info!(notification_id = %id, was_unread, "notification deleted");
            }
            RemoveOutcome::Missing => {
                tracing::debug!(notification_id = %id, "notification removed concurrently");
            }
        }
        Ok(())
    }

    /// Current, possibly uncommitted, settings.
    pub fn settings(&self) -> Result<NotificationSettings, Error> {
        Ok(self.lock_settings()?.current)
    }

    /// Apply every present field of `patch`.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<NotificationSettings, Error> {
        let mut state = self.lock_settings()?;
        state.current = state.current.apply(patch);
        Ok(state.current)
    }

    /// Flip one toggle.
    pub fn toggle_setting(&self, key: SettingKey) -> Result<NotificationSettings, Error> {
        let mut state = self.lock_settings()?;
        state.current = state.current.toggled(key);
        Ok(state.current)
    }

    /// Whether the current settings differ from the last committed ones.
    pub fn has_uncommitted_settings(&self) -> Result<bool, Error> {
        let state = self.lock_settings()?;
        Ok(state.current != state.committed)
    }

    /// Hand the current settings to the settings store.
    pub async fn commit_settings(&self) -> Result<NotificationSettings, Error> {
        let pending = self.settings()?;
        self.store.commit(&pending).await.map_err(|error| {
            tracing::warn!(kind = error.kind(), %error, "settings commit failed");
            settings_failure(&error)
        })?;
        self.lock_settings()?.committed = pending;
        tracing::info!(settings = ?pending, "notification settings committed");
        Ok(pending)
    }

    fn lock_settings(&self) -> Result<MutexGuard<'_, SettingsState>, Error> {
        self.settings
            .lock()
            .map_err(|_| Error::internal("notification settings lock poisoned"))
    }
}

fn poisoned(error: CachePoisoned) -> Error {
    tracing::error!(%error, "notification cache unavailable");
    Error::internal(error.to_string())
}

fn unknown_notification(id: &NotificationId) -> Error {
    Error::not_found(format!("notification {id} is not cached"))
        .with_details(json!({ "notificationId": id }))
}

fn upstream_failure(action: &str, id: &NotificationId, error: &UpstreamError) -> Error {
    tracing::warn!(
        notification_id = %id,
        cause = error.cause.kind(),
        %error,
        "notification command failed"
    );
    let message = format!("failed to {action}");
    let base = match &error.cause {
        UpstreamCause::Unauthorized { .. } => Error::unauthorized(message),
        UpstreamCause::NotFound { .. } => Error::not_found(message),
        UpstreamCause::Decode { .. } => Error::internal(message),
        UpstreamCause::Transport { .. }
        | UpstreamCause::Timeout { .. }
        | UpstreamCause::DeadlineExceeded
        | UpstreamCause::Status { .. } => Error::service_unavailable(message),
    };
    base.with_details(json!({ "notificationId": id, "cause": error.cause.kind() }))
}

fn settings_failure(error: &SettingsStoreError) -> Error {
    match error {
        SettingsStoreError::Unavailable { .. } => Error::service_unavailable(error.to_string()),
        SettingsStoreError::Rejected { .. } => Error::invalid_request(error.to_string()),
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
