//! Domain entities, ports and services.
//!
//! Purpose: assemble the member's dashboard from independently owned upstream
//! services and keep the notification list consistent with live pushes and
//! user actions. Nothing here knows about HTTP; adapters live under
//! `crate::outbound` and plug in through [`ports`].
//!
//! Public surface:
//! - [`AccountPortal`]: facade used by the presentation layer.
//! - [`DashboardAggregator`] and [`merge`]: fan-out and fan-in of one cycle.
//! - [`NotificationReconciler`]: push subscription task.
//! - [`NotificationLifecycle`]: mark-read, delete and settings commits.
//! - [`Error`]: failure payload for user-triggered operations.

mod account;
mod aggregator;
mod dashboard_service;
pub mod error;
mod lifecycle;
pub mod merge;
mod notification;
mod notification_cache;
mod portal;
pub mod ports;
mod reconciler;
mod session;
mod snapshot;
mod source;

pub use self::account::{
    CampaignDigest, CartDigest, CouponDigest, ExpiringRecord, PaymentMethodSummary,
    PointsBalance, ProfileData, RewardsDigest, UsageRecord,
};
pub use self::aggregator::{
    AggregateError, DashboardAggregator, FailurePolicy, ParseFailurePolicyError,
};
pub use self::dashboard_service::DashboardService;
pub use self::error::{Error, ErrorCode};
pub use self::lifecycle::NotificationLifecycle;
pub use self::merge::SourceResults;
pub use self::notification::{
    Notification, NotificationId, NotificationKind, NotificationSettings, SettingKey,
    SettingsPatch,
};
pub use self::notification_cache::{
    CachePoisoned, NotificationCache, NotificationView, PushMark, PushOutcome, ReadOutcome,
    RemoveOutcome,
};
pub use self::portal::{AccountPortal, PortalConfig, PortalPorts};
pub use self::reconciler::{
    BackoffJitter, FeedState, NotificationReconciler, RandomJitter, ReconcilerHandle,
    ReconcilerRuntime, ReconnectPolicy, ReconnectSleeper, TokioSleeper,
};
pub use self::session::SessionState;
pub use self::snapshot::{ActivityEvent, ActivitySource, DashboardSnapshot, ExpirationItem};
pub use self::source::Source;
