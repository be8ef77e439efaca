//! Commit boundary for notification settings.
//!
//! The core only applies toggles locally; whoever implements this port decides
//! where committed settings are persisted.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::NotificationSettings;

define_port_error! {
    /// Errors surfaced while committing settings.
    pub enum SettingsStoreError {
        /// The backing store could not be reached.
        Unavailable { message: String } =>
            "settings store unavailable: {message}",
        /// The backing store refused the settings.
        Rejected { message: String } =>
            "settings rejected: {message}",
    }
}

/// Port receiving committed notification settings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Persist `settings` as the member's current choice.
    async fn commit(&self, settings: &NotificationSettings) -> Result<(), SettingsStoreError>;
}

/// Store that accepts every commit without persisting it.
///
/// Suitable when the hosting application persists settings itself after
/// observing the commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardingSettingsStore;

#[async_trait]
impl SettingsStore for DiscardingSettingsStore {
    async fn commit(&self, settings: &NotificationSettings) -> Result<(), SettingsStoreError> {
        tracing::debug!(?settings, "notification settings committed without persistence");
        Ok(())
    }
}
