//! Driven port for the live notification push channel.
//!
//! A connection yields a lazy, unbounded stream of notifications. Streams end
//! when the transport closes; the reconciler decides when to reconnect.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::define_port_error;
use crate::domain::{Notification, NotificationId};

define_port_error! {
    /// Errors surfaced by the push channel.
    pub enum FeedError {
        /// The subscription could not be established.
        Connect { message: String } =>
            "push channel connect failed: {message}",
        /// An established subscription broke.
        Transport { message: String } =>
            "push channel transport failed: {message}",
        /// One message could not be decoded; the subscription is still usable.
        Decode { message: String } =>
            "push message decode failed: {message}",
        /// The push channel rejected the session.
        Unauthorized { message: String } =>
            "push channel rejected session: {message}",
    }
}

impl FeedError {
    /// Whether the error only affects one message.
    #[must_use]
    pub fn is_message_local(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Stream of pushed notifications for one subscription.
pub type NotificationStream = BoxStream<'static, Result<Notification, FeedError>>;

/// Port for subscribing to pushed notifications.
#[async_trait]
pub trait NotificationFeed: Send + Sync {
    /// Open a subscription.
    ///
    /// `resume_after` names the last notification already applied; the
    /// channel should only deliver notifications that arrived after it.
    async fn connect(
        &self,
        resume_after: Option<&NotificationId>,
    ) -> Result<NotificationStream, FeedError>;
}
