//! Driven port for notification mutations owned by the notification service.

use async_trait::async_trait;

use super::UpstreamResult;
use crate::domain::NotificationId;

/// Port for acknowledging and deleting notifications upstream.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCommand: Send + Sync {
    /// Record that the member read `id`.
    async fn mark_read(&self, id: &NotificationId) -> UpstreamResult<()>;

    /// Remove `id` for the member.
    async fn delete(&self, id: &NotificationId) -> UpstreamResult<()>;
}
