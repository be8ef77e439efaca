//! Long-lived owner of the member's notification list.
//!
//! The list and its unread counter always change under one write lock, so the
//! counter equals the number of unread items whenever a reader looks.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use super::{Notification, NotificationId};

/// Read-only copy of the cache handed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    /// Notifications, most recently delivered first.
    pub notifications: Vec<Notification>,
    /// Number of unread notifications in the list.
    pub unread_count: usize,
}

/// What [`NotificationCache::apply_push`] did with a delivered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Prepended to the list.
    Inserted,
    /// Already cached; ignored.
    Duplicate,
}

/// What [`NotificationCache::mark_read`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The notification moved from unread to read.
    Marked,
    /// The notification was already read.
    AlreadyRead,
    /// No notification with that id is cached.
    Missing,
}

/// What [`NotificationCache::remove`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Removed; `was_unread` reports whether the counter dropped.
    Removed {
        /// The removed item was unread.
        was_unread: bool,
    },
    /// No notification with that id is cached.
    Missing,
}

/// The cache lock was poisoned by a panicking writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("notification cache lock poisoned")]
pub struct CachePoisoned;

impl<T> From<PoisonError<T>> for CachePoisoned {
    fn from(_: PoisonError<T>) -> Self {
        Self
    }
}

/// Position in the push sequence, taken before a refresh fetches the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PushMark(u64);

#[derive(Debug, Default)]
struct CacheState {
    items: Vec<Notification>,
    unread: usize,
    pushes: u64,
    pushed_at: HashMap<NotificationId, u64>,
}

impl CacheState {
    fn view(&self) -> NotificationView {
        NotificationView {
            notifications: self.items.clone(),
            unread_count: self.unread,
        }
    }

    fn position(&self, id: &NotificationId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }
}

/// Shared handle to the notification list.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct NotificationCache {
    state: Arc<RwLock<CacheState>>,
}

impl NotificationCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the result of an initial fetch.
    ///
    /// Duplicate ids keep their first occurrence.
    pub fn seed(
        &self,
        notifications: Vec<Notification>,
    ) -> Result<NotificationView, CachePoisoned> {
        let mut state = self.write()?;
        let items = dedup(notifications);
        state.pushed_at.clear();
        state.unread = items.iter().filter(|item| !item.read).count();
        state.items = items;
        Ok(state.view())
    }

    /// Current position in the push sequence.
    pub fn push_mark(&self) -> Result<PushMark, CachePoisoned> {
        Ok(PushMark(self.read()?.pushes))
    }

    /// Replace the contents with a list fetched after `since` was taken.
    ///
    /// Pushes applied after `since` that the fetch does not contain stay at
    /// the front in their current order.
    pub fn reseed(
        &self,
        notifications: Vec<Notification>,
        since: PushMark,
    ) -> Result<NotificationView, CachePoisoned> {
        let mut state = self.write()?;
        let fetched = dedup(notifications);
        let kept: Vec<Notification> = state
            .items
            .iter()
            .filter(|item| {
                state
                    .pushed_at
                    .get(&item.id)
                    .is_some_and(|sequence| *sequence > since.0)
                    && !fetched.iter().any(|other| other.id == item.id)
            })
            .cloned()
            .collect();
        state
            .pushed_at
            .retain(|id, _| kept.iter().any(|item| &item.id == id));
        let items: Vec<Notification> = kept.into_iter().chain(fetched).collect();
        state.unread = items.iter().filter(|item| !item.read).count();
        state.items = items;
        Ok(state.view())
    }

    /// Prepend a pushed notification unless its id is already cached.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use loyalty_dashboard::domain::{
    ///     Notification, NotificationCache, NotificationId, NotificationKind, PushOutcome,
    /// };
    ///
    /// let cache = NotificationCache::new();
    /// let pushed = Notification {
    ///     id: NotificationId::new("n9"),
    ///     title: "Bonus".into(),
    ///     message: "Double points today".into(),
    ///     kind: NotificationKind::Success,
    ///     timestamp: Utc::now(),
    ///     read: false,
    /// };
    /// let (outcome, view) = cache.apply_push(pushed.clone()).expect("cache");
    /// assert_eq!(outcome, PushOutcome::Inserted);
    /// assert_eq!(view.unread_count, 1);
    /// let (outcome, _) = cache.apply_push(pushed).expect("cache");
    /// assert_eq!(outcome, PushOutcome::Duplicate);
    /// ```
    pub fn apply_push(
        &self,
        notification: Notification,
    ) -> Result<(PushOutcome, NotificationView), CachePoisoned> {
        let mut state = self.write()?;
        if state.position(&notification.id).is_some() {
            return Ok((PushOutcome::Duplicate, state.view()));
        }
        if !notification.read {
            state.unread += 1;
        }
        state.pushes += 1;
        let sequence = state.pushes;
        state.pushed_at.insert(notification.id.clone(), sequence);
        state.items.insert(0, notification);
        Ok((PushOutcome::Inserted, state.view()))
    }

    /// Move `id` from unread to read.
    pub fn mark_read(&self, id: &NotificationId) -> Result<ReadOutcome, CachePoisoned> {
        let mut state = self.write()?;
        let Some(index) = state.position(id) else {
            return Ok(ReadOutcome::Missing);
        };
        if state.items[index].read {
            return Ok(ReadOutcome::AlreadyRead);
        }
        state.items[index].read = true;
        state.unread = state.unread.saturating_sub(1);
        Ok(ReadOutcome::Marked)
    }

    /// Remove `id`, keeping the order of the remaining items.
    pub fn remove(&self, id: &NotificationId) -> Result<RemoveOutcome, CachePoisoned> {
        let mut state = self.write()?;
        let Some(index) = state.position(id) else {
            return Ok(RemoveOutcome::Missing);
        };
        let removed = state.items.remove(index);
        state.pushed_at.remove(id);
        if !removed.read {
            state.unread = state.unread.saturating_sub(1);
        }
        Ok(RemoveOutcome::Removed {
            was_unread: !removed.read,
        })
    }

    /// Look up one cached notification.
    pub fn get(&self, id: &NotificationId) -> Result<Option<Notification>, CachePoisoned> {
        let state = self.read()?;
        Ok(state.position(id).map(|index| state.items[index].clone()))
    }

    /// Copy of the current list and counter.
    pub fn view(&self) -> Result<NotificationView, CachePoisoned> {
        Ok(self.read()?.view())
    }

    /// Current unread counter.
    pub fn unread_count(&self) -> Result<usize, CachePoisoned> {
        Ok(self.read()?.unread)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CacheState>, CachePoisoned> {
        Ok(self.state.read()?)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CacheState>, CachePoisoned> {
        Ok(self.state.write()?)
    }
}

fn dedup(notifications: Vec<Notification>) -> Vec<Notification> {
    let mut items: Vec<Notification> = Vec::with_capacity(notifications.len());
    for notification in notifications {
        if !items.iter().any(|item| item.id == notification.id) {
            items.push(notification);
        }
    }
    items
}

#[cfg(test)]
#[path = "notification_cache_tests.rs"]
mod tests;
