//! Notification entities and notification settings.
//!
//! A [`Notification`] is identified by its [`NotificationId`]. Its `read` flag
//! only ever moves from `false` to `true`; removal is terminal.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Upstream-assigned notification identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Wrap an upstream identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Presentation category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Something completed successfully.
    Success,
    /// Something needs the member's attention.
    Warning,
    /// Informational.
    Info,
    /// Anything else, including unknown upstream types.
    #[default]
    Default,
}

impl NotificationKind {
    /// Map an upstream type label, falling back to [`NotificationKind::Default`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "success" => Self::Success,
            "warning" => Self::Warning,
            "info" => Self::Info,
            _ => Self::Default,
        }
    }
}

/// One notification held in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Identity.
    pub id: NotificationId,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Presentation category.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Upstream creation time.
    pub timestamp: DateTime<Utc>,
    /// Whether the member has read it.
    pub read: bool,
}

/// Delivery channel toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// E-mail delivery.
    pub email: bool,
    /// Mobile push delivery.
    pub push: bool,
    /// In-app delivery.
    pub in_app: bool,
    /// Marketing messages.
    pub marketing: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            in_app: true,
            marketing: false,
        }
    }
}

/// Identifies one settings toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// [`NotificationSettings::email`].
    Email,
    /// [`NotificationSettings::push`].
    Push,
    /// [`NotificationSettings::in_app`].
    InApp,
    /// [`NotificationSettings::marketing`].
    Marketing,
}

/// Partial settings update; `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsPatch {
    /// New e-mail toggle.
    pub email: Option<bool>,
    /// New push toggle.
    pub push: Option<bool>,
    /// New in-app toggle.
    pub in_app: Option<bool>,
    /// New marketing toggle.
    pub marketing: Option<bool>,
}

impl NotificationSettings {
    /// Return these settings with every present patch field applied.
    ///
    /// # Examples
    /// ```
    /// use loyalty_dashboard::domain::{NotificationSettings, SettingsPatch};
    ///
    /// let settings = NotificationSettings::default().apply(SettingsPatch {
    ///     marketing: Some(true),
    ///     ..SettingsPatch::default()
    /// });
    /// assert!(settings.marketing);
    /// assert!(settings.email);
    /// ```
    #[must_use]
    pub fn apply(self, patch: SettingsPatch) -> Self {
        Self {
            email: patch.email.unwrap_or(self.email),
            push: patch.push.unwrap_or(self.push),
            in_app: patch.in_app.unwrap_or(self.in_app),
            marketing: patch.marketing.unwrap_or(self.marketing),
        }
    }

    /// Return these settings with one toggle flipped.
    #[must_use]
    pub fn toggled(self, key: SettingKey) -> Self {
        let mut next = self;
        match key {
            SettingKey::Email => next.email = !next.email,
            SettingKey::Push => next.push = !next.push,
            SettingKey::InApp => next.in_app = !next.in_app,
            SettingKey::Marketing => next.marketing = !next.marketing,
        }
        next
    }
}
