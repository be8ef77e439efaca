//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_gateway;
mod auth_context;
mod notification_command;
mod notification_feed;
mod settings_store;

#[cfg(test)]
pub use account_gateway::MockAccountGateway;
pub use account_gateway::{
    AccountGateway, FetchOptions, UpstreamCause, UpstreamError, UpstreamResult,
};
pub use auth_context::{AuthContext, BearerToken, RejectedBy, SessionInvalidated};
#[cfg(test)]
pub use notification_command::MockNotificationCommand;
pub use notification_command::NotificationCommand;
pub use notification_feed::{FeedError, NotificationFeed, NotificationStream};
#[cfg(test)]
pub use settings_store::MockSettingsStore;
pub use settings_store::{DiscardingSettingsStore, SettingsStore, SettingsStoreError};
